//! Utilities.

/// Returns the value inside `Some`, or evaluates the given expression (typically a control-flow statement).
#[macro_export]
macro_rules! some_or {
    ($e:expr, $err:expr) => {{
        match $e {
            Some(r) => r,
            None => $err,
        }
    }};
}
