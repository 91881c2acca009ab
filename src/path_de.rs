//! JSON decoding with the JSON path of the failure in the error message.
use serde::de::DeserializeOwned;

use crate::error::{ModelError, Result};

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(path_error)?;
    de.end()?;
    Ok(value)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(path_error)?;
    de.end()?;
    Ok(value)
}

fn path_error(err: serde_path_to_error::Error<serde_json::Error>) -> ModelError {
    let path = err.path().to_string();
    ModelError::Parse(format!("at JSON path {path}: {}", err.into_inner()))
}
