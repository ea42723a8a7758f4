use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{models::media::SelectedFile, Error, Result};

/// Turns a selected file into something the client can display.
#[async_trait]
pub trait MediaDecoder: Send + Sync {
    async fn decode(&self, file: &SelectedFile) -> Result<String>;
}

/// Encodes the file as a `data:` URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataUrlDecoder;

#[async_trait]
impl MediaDecoder for DataUrlDecoder {
    async fn decode(&self, file: &SelectedFile) -> Result<String> {
        if file.bytes.is_empty() {
            return Err(Error::Decode(format!("{} is empty", file.name)));
        }

        let media_type = file.media_type()?;
        let bytes = file.bytes.clone();
        let payload = tokio::task::spawn_blocking(move || STANDARD.encode(&bytes))
            .await
            .map_err(|err| Error::Decode(err.to_string()))?;

        Ok(format!("data:{};base64,{}", media_type.mime(), payload))
    }
}
