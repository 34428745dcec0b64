use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::scanner::token::Keyword;

/// Keyword table, spelled word to keyword kind.
pub type Keywords = HashMap<String, Keyword>;

/// Loads the keyword spellings. The JSON file maps concept words (`"variable"`, `"if"`, ...)
/// to the spelling the scanner should recognise; concepts it leaves out keep no spelling, and
/// unknown concepts are ignored.
pub fn load_keywords(path: Option<&Path>) -> Result<Keywords> {
    let map: HashMap<String, String> = match path {
        Some(p) => {
            let contents = fs::read_to_string(p)?;
            serde_json::from_str(&contents)?
        }
        None => default_spellings(),
    };

    let mut keywords = HashMap::new();
    for (concept, spelling) in map {
        if let Some(keyword) = concept_to_keyword(&concept) {
            keywords.insert(spelling, keyword);
        }
    }

    Ok(keywords)
}

/// The built-in keyword set, no I/O involved.
pub fn default_keywords() -> Keywords {
    default_spellings()
        .into_iter()
        .filter_map(|(concept, spelling)| concept_to_keyword(&concept).map(|k| (spelling, k)))
        .collect()
}

fn default_spellings() -> HashMap<String, String> {
    HashMap::from([
        ("variable".into(), "变量".into()),
        ("constant".into(), "常量".into()),
        ("if".into(), "如果".into()),
        ("else".into(), "否则".into()),
        ("loop".into(), "循环".into()),
        ("function".into(), "函数".into()),
        ("return".into(), "返回".into()),
        ("print".into(), "输出".into()),
    ])
}

fn concept_to_keyword(s: &str) -> Option<Keyword> {
    match s {
        "variable" => Some(Keyword::Variable),
        "constant" => Some(Keyword::Constant),
        "if" => Some(Keyword::If),
        "else" => Some(Keyword::Else),
        "loop" => Some(Keyword::Loop),
        "function" => Some(Keyword::Function),
        "return" => Some(Keyword::Return),
        "print" => Some(Keyword::Print),
        _ => None,
    }
}

/// Spelling of `keyword` in `keywords`, used when printing source back out.
pub fn spelling_of(keywords: &Keywords, keyword: Keyword) -> Option<&str> {
    keywords
        .iter()
        .find(|(_, k)| **k == keyword)
        .map(|(spelling, _)| spelling.as_str())
}
