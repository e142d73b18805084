use serde::{Deserialize, Serialize};

/// One post fetched from the social feed.
///
/// The platform transmits identifiers as decimal strings but they are
/// snowflake-style integers; comparing them as strings misorders ids of
/// differing digit lengths ("9" > "10"), so they are parsed to `u64` at the
/// serde boundary and every ordering and watermark comparison is numeric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    #[serde(with = "string_id")]
    pub id: u64,
    pub author_id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default, with = "opt_string_id")]
    pub in_reply_to: Option<u64>,
    #[serde(with = "string_id")]
    pub conversation_id: u64,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default)]
    pub is_retweet: bool,
}

/// A generated coin name plus the model's one-paragraph justification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemeCoinSuggestion {
    #[serde(rename = "coinName")]
    pub coin_name: String,
    pub reasoning: String,
}

impl MemeCoinSuggestion {
    /// Substitute used when the completion cannot be parsed or the
    /// generator is unreachable.
    pub fn fallback() -> Self {
        Self {
            coin_name: "DefaultCoin".to_owned(),
            reasoning: "Could not generate a specific suggestion at this time.".to_owned(),
        }
    }

    /// Substitute used when the moderation check rejects a suggestion.
    pub fn moderated() -> Self {
        Self {
            coin_name: "GeneralMemeCoin".to_owned(),
            reasoning: "Generated suggestion was not appropriate. Please try again with different content."
                .to_owned(),
        }
    }
}

mod string_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

mod opt_string_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.collect_str(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| s.parse().map_err(de::Error::custom)).transpose()
    }
}
