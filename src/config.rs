// the evaluator grows its own stack, so this bounds runaway recursion rather than frame size
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub max_call_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            // set default values here, unless overridden via command-line
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}
