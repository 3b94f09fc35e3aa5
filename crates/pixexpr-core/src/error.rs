/// Errors raised while turning expression source into a token stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expression is empty")]
    EmptyExpression,

    #[error("unknown token `{0}`")]
    UnknownToken(String),

    #[error("variable `{0}` is not available in this context")]
    VariableNotAllowed(String),

    #[error("`{token}` at position {position} needs more operands than the stack holds")]
    StackUnderflow { token: String, position: usize },

    #[error("expression leaves {depth} values on the stack, expected 1")]
    UnbalancedStack { depth: usize },

    #[error("invalid parameter scale `{0}`")]
    InvalidParamScale(String),
}
