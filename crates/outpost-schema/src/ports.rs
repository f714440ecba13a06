use crate::SchemaError;

/// Validate a user-supplied port against the TCP range, then against the
/// reserved list. Returns the parsed port.
///
/// Range is checked first, so `"0"` is reported as invalid even when it also
/// appears in `reserved_ports`. Reserved entries are compared by value, so
/// `"02200"` and `"+2200"` are both caught by a reserved `"2200"`.
pub fn check_port_validity<S: AsRef<str>>(
    port: &str,
    reserved_ports: &[S],
) -> Result<u16, SchemaError> {
    let parsed = port
        .parse::<i64>()
        .ok()
        .filter(|p| (1..=65535).contains(p))
        .and_then(|p| u16::try_from(p).ok())
        .ok_or_else(|| SchemaError::InvalidPort(port.to_owned()))?;

    let reserved = reserved_ports.iter().any(|entry| {
        let entry = entry.as_ref();
        entry == port || entry.parse::<u16>().is_ok_and(|value| value == parsed)
    });
    if reserved {
        return Err(SchemaError::ReservedPort(port.to_owned()));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn accepts_bounds_and_common_ports() {
        assert_eq!(check_port_validity("1", &NONE).unwrap(), 1);
        assert_eq!(check_port_validity("65535", &NONE).unwrap(), 65535);
        assert_eq!(check_port_validity("8080", &["2200"]).unwrap(), 8080);
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        for port in ["0", "65536", "-1", "invalid_port", "", "80.5"] {
            assert!(
                matches!(check_port_validity(port, &NONE), Err(SchemaError::InvalidPort(_))),
                "expected '{port}' to be invalid"
            );
        }
    }

    #[test]
    fn rejects_reserved_port() {
        assert!(matches!(
            check_port_validity("2200", &["2200", "8", "100"]),
            Err(SchemaError::ReservedPort(p)) if p == "2200"
        ));
    }

    #[test]
    fn reserved_port_is_matched_by_value() {
        for port in ["02200", "+2200", "002200"] {
            assert!(
                matches!(
                    check_port_validity(port, &["2200"]),
                    Err(SchemaError::ReservedPort(p)) if p == port
                ),
                "expected '{port}' to be reserved"
            );
        }
        assert!(matches!(
            check_port_validity("2200", &["+2200"]),
            Err(SchemaError::ReservedPort(_))
        ));
        assert_eq!(check_port_validity("02201", &["2200"]).unwrap(), 2201);
    }

    #[test]
    fn range_is_checked_before_reservation() {
        assert!(matches!(
            check_port_validity("0", &["0"]),
            Err(SchemaError::InvalidPort(_))
        ));
    }

    #[test]
    fn accepts_owned_reserved_list() {
        let reserved = vec!["22".to_owned()];
        assert!(check_port_validity("22", &reserved).is_err());
        assert!(check_port_validity("23", &reserved).is_ok());
    }
}
