// src/common/query.rs

// Helpers para parâmetros de query string.
// O front-end manda `clientId=` ou `clientId=0` quando o filtro não foi escolhido:
// os dois casos significam "sem filtro", nunca "filtrar pelo id 0".

use serde::{de::Error as _, Deserialize, Deserializer};

/// Desserializa um id opcional tratando "", "0" e ausência como `None`.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let id: i32 = value
                .parse()
                .map_err(|_| D::Error::custom(format!("id inválido: {value}")))?;
            Ok(non_zero(Some(id)))
        }
    }
}

/// Desserializa um texto opcional tratando "" (ou só espaços) como `None`.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

/// Desserializa um limite de linhas; "", "0" e ausência significam "sem limite".
pub fn optional_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let limit: i64 = value
                .parse()
                .map_err(|_| D::Error::custom(format!("limite inválido: {value}")))?;
            Ok(Some(limit).filter(|limit| *limit > 0))
        }
    }
}

pub fn non_zero(id: Option<i32>) -> Option<i32> {
    id.filter(|value| *value != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "optional_id")]
        client_id: Option<i32>,
        #[serde(default, deserialize_with = "optional_text")]
        month: Option<String>,
        #[serde(default, deserialize_with = "optional_limit")]
        limit: Option<i64>,
    }

    fn parse(json: &str) -> Params {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn zero_and_empty_mean_unspecified() {
        assert_eq!(parse(r#"{"client_id": "0"}"#).client_id, None);
        assert_eq!(parse(r#"{"client_id": ""}"#).client_id, None);
        assert_eq!(parse(r#"{}"#).client_id, None);
        assert_eq!(parse(r#"{"client_id": "12"}"#).client_id, Some(12));
    }

    #[test]
    fn blank_text_is_none() {
        assert_eq!(parse(r#"{"month": "  "}"#).month, None);
        assert_eq!(parse(r#"{"month": "03/2024"}"#).month.as_deref(), Some("03/2024"));
    }

    #[test]
    fn blank_or_zero_limit_means_all_rows() {
        assert_eq!(parse(r#"{"limit": ""}"#).limit, None);
        assert_eq!(parse(r#"{"limit": "0"}"#).limit, None);
        assert_eq!(parse(r#"{"limit": "25"}"#).limit, Some(25));
    }

    #[test]
    fn garbage_id_is_rejected() {
        assert!(serde_json::from_str::<Params>(r#"{"client_id": "abc"}"#).is_err());
    }
}
