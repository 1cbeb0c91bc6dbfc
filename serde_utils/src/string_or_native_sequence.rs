use core::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(
    transparent,
    bound(deserialize = "T: Deserialize<'de> + FromStr, T::Err: Display")
)]
struct Element<T>(#[serde(deserialize_with = "crate::string_or_native::deserialize")] T);

pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
    D: Deserializer<'de>,
{
    let elements = Vec::<Element<T>>::deserialize(deserializer)?;
    Ok(elements.into_iter().map(|Element(value)| value).collect())
}

pub fn serialize<T, S>(values: &[T], serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize + Display,
    S: Serializer,
{
    if serializer.is_human_readable() {
        serializer.collect_seq(values.iter().map(ToString::to_string))
    } else {
        values.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(PartialEq, Eq, Debug, Deserialize, Serialize)]
    struct Wrapper {
        #[serde(with = "crate::string_or_native_sequence")]
        attesting_indices: Vec<u64>,
    }

    #[test]
    fn accepts_strings_and_numbers() -> serde_json::Result<()> {
        let wrapper = serde_json::from_value::<Wrapper>(json!({ "attesting_indices": ["1", 2] }))?;

        assert_eq!(wrapper.attesting_indices, [1, 2]);
        assert_eq!(
            serde_json::to_value(&wrapper)?,
            json!({ "attesting_indices": ["1", "2"] }),
        );

        Ok(())
    }
}
