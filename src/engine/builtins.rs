use crate::engine::eval::RuntimeError;
use crate::engine::value::Value;
use tracing::{error, trace};

// panjang(x): character count of a string or element count of an array.
#[tracing::instrument(level = "debug", skip(value), fields(value = ?value), ret, err)]
pub fn length_of(value: &Value, line: usize) -> Result<Value, RuntimeError> {
    trace!("Executing builtin: panjang");
    match value {
        Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
        other => {
            let err = RuntimeError::UnsupportedLength {
                found: other.to_string(),
                line,
            };
            error!(error = %err, type_name = other.type_name(), "Unsupported argument to 'panjang'");
            Err(err)
        }
    }
}

/// Renders the arguments of `cetak` as one line, space separated, without
/// the trailing newline.
pub fn render_print_line(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;
    use std::rc::Rc;

    #[test]
    fn length_counts_characters_not_bytes() {
        init_test_logging();
        let value = Value::String("héllo".to_string());
        assert_eq!(length_of(&value, 1), Ok(Value::Integer(5)));
    }

    #[test]
    fn length_of_array() {
        init_test_logging();
        let value = Value::Array(Rc::new(vec![Value::Nil, Value::Integer(1)]));
        assert_eq!(length_of(&value, 1), Ok(Value::Integer(2)));
    }

    #[test]
    fn length_of_integer_is_rejected() {
        init_test_logging();
        let err = length_of(&Value::Integer(3), 7).unwrap_err();
        assert_eq!(err.to_string(), "7: argumen panjang tidak didukung dekat '3'");
    }

    #[test]
    fn print_line_joins_with_spaces() {
        init_test_logging();
        let values = vec![
            Value::Integer(1),
            Value::String("dua tiga".to_string()),
            Value::Boolean(false),
            Value::Nil,
        ];
        assert_eq!(render_print_line(&values), "1 dua tiga salah NIL");
        assert_eq!(render_print_line(&[]), "");
    }
}
