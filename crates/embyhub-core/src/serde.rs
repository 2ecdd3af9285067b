// Module name shadows the `serde` crate; use `::serde` for the external crate.
use ::serde::Serializer;
use chrono::{DateTime, SecondsFormat, Utc};

/// Render an epoch-seconds value as an RFC 3339 UTC string.
///
/// Returns `None` for `0` and out-of-range values; the store uses `0` as "unset".
pub fn epoch_to_rfc3339(secs: i64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Serialize an optional epoch-seconds timestamp as RFC 3339, or `null` when unset.
pub fn opt_epoch_as_rfc3339<S>(secs: &Option<i64>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match secs.and_then(epoch_to_rfc3339) {
        Some(text) => s.serialize_str(&text),
        None => s.serialize_none(),
    }
}
