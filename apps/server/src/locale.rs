//! User-facing messages.
//!
//! Every string that reaches a client goes through [`Locale`], so the whole
//! server can be switched between languages with `MESSAGES_LOCALE`.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "es" | "es-es" => Ok(Locale::Es),
            other => Err(other.to_string()),
        }
    }
}

impl Locale {
    /// Quota reached. `retry_hint` is a human-readable moment, e.g. an RFC 3339 timestamp.
    pub fn limit_reached(&self, max_attempts: i64, window_hours: i64, retry_hint: &str) -> String {
        match self {
            Locale::En => format!(
                "You have reached the limit of {max_attempts} downloads per {window_hours} hours for this file. Try again after {retry_hint}."
            ),
            Locale::Es => format!(
                "Has alcanzado el límite de {max_attempts} descargas cada {window_hours} horas para este archivo. Inténtalo de nuevo después de {retry_hint}."
            ),
        }
    }

    /// The attempt log could not be read; the download is allowed anyway.
    pub fn limit_check_unavailable(&self) -> &'static str {
        match self {
            Locale::En => "Could not verify download limits, proceeding...",
            Locale::Es => "Error verificando límites de descarga, procediendo...",
        }
    }

    pub fn download_started(&self, remaining: i64) -> String {
        match self {
            Locale::En => format!(
                "Download started. You have {remaining} downloads left for this file."
            ),
            Locale::Es => format!(
                "Descarga iniciada. Te quedan {remaining} descargas para este archivo."
            ),
        }
    }

    pub fn file_not_found(&self) -> &'static str {
        match self {
            Locale::En => "File not found or not available",
            Locale::Es => "Archivo no encontrado o no disponible",
        }
    }

    pub fn link_failed(&self) -> &'static str {
        match self {
            Locale::En => "Error generating download link",
            Locale::Es => "Error generando enlace de descarga",
        }
    }

    pub fn internal_error(&self) -> &'static str {
        match self {
            Locale::En => "Internal server error",
            Locale::Es => "Error interno del servidor",
        }
    }
}
