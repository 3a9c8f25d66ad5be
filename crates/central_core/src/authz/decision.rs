//! Tri-state authorization outcome.

use std::fmt::{Display, Formatter};

/// Result of one authorization check.
///
/// Ordering is by strength: `Forbidden < Conflict < Allowed`, so the
/// combined decision over several roles is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Decision {
    /// The actor's roles never permit the action.
    Forbidden,
    /// A role permits the action but the resource state precludes it now.
    Conflict,
    Allowed,
}

impl Decision {
    /// Transport status the request router answers with.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Allowed => 200,
            Self::Forbidden => 403,
            Self::Conflict => 409,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
        }
    }

    /// Combines decisions from several roles. An empty input is `Forbidden`.
    pub fn combine(decisions: impl IntoIterator<Item = Decision>) -> Decision {
        decisions.into_iter().max().unwrap_or(Decision::Forbidden)
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Decision;

    #[test]
    fn maps_to_transport_status() {
        assert_eq!(Decision::Allowed.status_code(), 200);
        assert_eq!(Decision::Forbidden.status_code(), 403);
        assert_eq!(Decision::Conflict.status_code(), 409);
    }

    #[test]
    fn combine_prefers_allowed_then_conflict() {
        assert_eq!(Decision::combine([]), Decision::Forbidden);
        assert_eq!(
            Decision::combine([Decision::Forbidden, Decision::Conflict]),
            Decision::Conflict
        );
        assert_eq!(
            Decision::combine([Decision::Conflict, Decision::Allowed, Decision::Forbidden]),
            Decision::Allowed
        );
    }
}
