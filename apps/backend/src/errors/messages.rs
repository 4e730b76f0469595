//! User-facing error messages. These strings are part of the API contract.

pub const INVALID_CREDENTIALS: &str = "Credenciales inválidas";
pub const INVALID_EMAIL_FORMAT: &str = "El formato del email es inválido";
pub const WEAK_PASSWORD: &str = "La contraseña debe tener al menos 8 caracteres";
pub const INVALID_TOKEN: &str = "Token inválido o expirado";
pub const MISSING_TOKEN: &str = "Token de autenticación requerido";
pub const ACCESS_DENIED: &str = "Acceso denegado";
pub const INTERNAL_ERROR: &str = "Error interno del servidor";
pub const VALIDATION_FAILED: &str = "Errores de validación en los campos";
pub const DB_UNAVAILABLE: &str = "Servicio de base de datos no disponible";
pub const SYNC_IN_PROGRESS: &str = "Ya hay una sincronización en curso";

pub fn empty_field(field: &str) -> String {
    format!("El campo '{field}' no puede estar vacío")
}

pub fn email_taken(email: &str) -> String {
    format!("El email '{email}' ya está registrado")
}

pub fn crypto_not_found(coin_id: &str) -> String {
    format!("Criptomoneda no encontrada: {coin_id}")
}

pub fn cache_not_found(name: &str) -> String {
    format!("Caché no encontrada: {name}")
}

pub fn external_service(detail: &str) -> String {
    format!("Error al comunicarse con el servicio externo: {detail}")
}
