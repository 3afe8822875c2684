//! Composite import ids.

use crate::{ProviderError, Result};

/// Split `id` on `:` into exactly `N` parts.
///
/// Like `splitn`, the last part keeps any further colons, so
/// `"ws:split:env:extra"` parsed into three parts ends with `"env:extra"`.
pub fn parse_composite_id<'a, const N: usize>(
    id: &'a str,
    example: &'static str,
) -> Result<[&'a str; N]> {
    let parts: Vec<&str> = id.splitn(N, ':').collect();

    parts.try_into().map_err(|_| ProviderError::InvalidImportId {
        id: id.to_string(),
        expected: N,
        example,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_parts() {
        let [ws, split, env] = parse_composite_id::<3>("ws-1:new_checkout:env-1", "x:y:z").unwrap();
        assert_eq!((ws, split, env), ("ws-1", "new_checkout", "env-1"));
    }

    #[test]
    fn test_last_part_keeps_colons() {
        let [env, segment] = parse_composite_id::<2>("env-1:beta:testers", "x:y").unwrap();
        assert_eq!(env, "env-1");
        assert_eq!(segment, "beta:testers");
    }

    #[test]
    fn test_too_few_parts() {
        let err = parse_composite_id::<3>("ws-1:new_checkout", "x:y:z").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidImportId { expected: 3, .. }));
    }
}
