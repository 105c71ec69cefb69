//! Conversions from external infrastructure errors into domain errors.

use almanac_domain::AlmanacError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AlmanacError);

impl From<InfraError> for AlmanacError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AlmanacError> for InfraError {
    fn from(value: AlmanacError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoAlmanacError {
    fn into_almanac(self) -> AlmanacError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → AlmanacError */
/* -------------------------------------------------------------------------- */

impl IntoAlmanacError for SqlError {
    fn into_almanac(self) -> AlmanacError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        AlmanacError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        AlmanacError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        AlmanacError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 275) => {
                        AlmanacError::InvalidInput(format!("check constraint violation: {message}"))
                    }
                    _ => AlmanacError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => AlmanacError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                AlmanacError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                AlmanacError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => AlmanacError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => AlmanacError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_almanac())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → AlmanacError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(AlmanacError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AlmanacError */
/* -------------------------------------------------------------------------- */

impl IntoAlmanacError for HttpError {
    fn into_almanac(self) -> AlmanacError {
        if self.is_timeout() {
            return AlmanacError::RemoteUnavailable("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AlmanacError::RemoteUnavailable("HTTP connection failure".into());
        }

        if self.is_decode() {
            return AlmanacError::RemoteUnavailable(format!("undecodable response body: {self}"));
        }

        if let Some(status) = self.status() {
            return status_error(status, String::new());
        }

        AlmanacError::RemoteUnavailable(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_almanac())
    }
}

/// Map a non-success provider status to a domain error.
///
/// 401/403 mean the grant is no longer usable; 429 and 5xx are worth a retry;
/// any other 4xx is a request we should not repeat unchanged.
pub fn status_error(status: reqwest::StatusCode, body: String) -> AlmanacError {
    let code = status.as_u16();
    let mut message =
        format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    if !body.is_empty() {
        message.push_str(": ");
        message.push_str(body.trim());
    }

    match code {
        401 | 403 => AlmanacError::AuthExpired(message),
        404 => AlmanacError::NotFound(message),
        429 => AlmanacError::RemoteUnavailable(message),
        400..=499 => AlmanacError::InvalidInput(message),
        _ => AlmanacError::RemoteUnavailable(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
