//! Unit tests for the Value enum

use core_types::Value;

#[cfg(test)]
mod value_conversion_tests {
    use super::*;

    #[test]
    fn test_from_str_builds_string() {
        assert!(matches!(Value::from("ok"), Value::String(ref s) if s == "ok"));
    }

    #[test]
    fn test_from_owned_string() {
        assert_eq!(Value::from(String::from("res1:ok")), Value::from("res1:ok"));
    }

    #[test]
    fn test_from_i32_builds_smi() {
        assert!(matches!(Value::from(i32::MIN), Value::Smi(n) if n == i32::MIN));
    }

    #[test]
    fn test_from_f64_builds_double() {
        assert!(matches!(Value::from(0.5), Value::Double(n) if n == 0.5));
    }

    #[test]
    fn test_from_bool_builds_boolean() {
        assert_eq!(Value::from(true), Value::Boolean(true));
    }
}

#[cfg(test)]
mod value_to_string_tests {
    use super::*;

    #[test]
    fn test_string_concatenation_matches_host() {
        let reason = Value::from("err");
        assert_eq!(Value::from(format!("{}2", reason)), Value::from("err2"));
    }

    #[test]
    fn test_double_special_values() {
        assert_eq!(Value::Double(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_smi_negative_to_string() {
        assert_eq!(Value::Smi(-100).to_string(), "-100");
    }
}

#[cfg(test)]
mod value_equality_tests {
    use super::*;

    #[test]
    fn test_value_partial_eq() {
        assert_eq!(Value::Undefined, Value::Undefined);
        assert_ne!(Value::Null, Value::Undefined);
        assert_ne!(Value::Smi(1), Value::Double(1.0));
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
    }
}
