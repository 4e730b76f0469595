use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::debug;

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::logging::pii::Redacted;

/// Request bodies above this are rejected before parsing.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// JSON body extractor whose failures render as problem details (400
/// `BAD_REQUEST`) instead of actix's plain-text errors.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> JsonBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for JsonBody<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn describe(error: &serde_json::Error) -> String {
    match error.classify() {
        Category::Syntax => format!("JSON inválido en la línea {}", error.line()),
        Category::Eof => "JSON incompleto".to_string(),
        Category::Data => "Tipos de datos inválidos en el cuerpo de la petición".to_string(),
        Category::Io => "No se pudo leer el cuerpo de la petición".to_string(),
    }
}

impl<T> FromRequest for JsonBody<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(_req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let mut payload = payload.take();

        Box::pin(async move {
            let mut body = BytesMut::new();
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    debug!(error = %e, "request body read failed");
                    AppError::bad_request(
                        ErrorCode::BadRequest,
                        "No se pudo leer el cuerpo de la petición",
                    )
                })?;
                if body.len() + chunk.len() > MAX_BODY_BYTES {
                    return Err(AppError::bad_request(
                        ErrorCode::BadRequest,
                        "El cuerpo de la petición es demasiado grande",
                    ));
                }
                body.extend_from_slice(&chunk);
            }

            if body.is_empty() {
                return Err(AppError::bad_request(
                    ErrorCode::BadRequest,
                    "El cuerpo de la petición es obligatorio",
                ));
            }

            serde_json::from_slice::<T>(&body)
                .map(JsonBody)
                .map_err(|e| {
                    debug!(error = %Redacted(&e.to_string()), body_size = body.len(), "JSON parsing failed");
                    AppError::bad_request(ErrorCode::BadRequest, describe(&e))
                })
        })
    }
}
