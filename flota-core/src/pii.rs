use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for roster fields that must not land in logs (license numbers,
/// phone numbers). `Debug` and `Display` render asterisks so a stray
/// `tracing::info!("{:?}", t)` cannot leak them; `Serialize` passes the real
/// value through because API responses need it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> From<T> for Masked<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }

    pub fn as_inner(&self) -> &T {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_value_serialize_keeps_it() {
        let licencia: Masked<String> = "LIC-889123".to_string().into();
        assert_eq!(format!("{:?}", licencia), "********");
        assert_eq!(
            serde_json::to_string(&licencia).unwrap(),
            "\"LIC-889123\""
        );
    }
}
