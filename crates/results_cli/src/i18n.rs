//! User-facing messages in Spanish and English.
//!
//! The language lives in a `Catalog` value handed to whoever prints; nothing
//! below the CLI knows about languages.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "es" => Some(Language::Es),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    FetchingResults,
    SubmittingForm,
    DownloadingPdf,
    NoResults,
    Order,
    License,
    Transmitted,
    PatientSaved,
    PatientCleared,
    PatientIncomplete,
    NoPatientInfo,
    InvalidLink,
    MissingLookupKey,
    FetchFailed,
    PortalRejected,
    PortalTimeout,
    PdfFailed,
    NotAPdf,
    SaveFailed,
    LanguageSaved,
    UnknownLanguage,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Catalog {
    language: Language,
}

impl Catalog {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn text(&self, message: Message) -> &'static str {
        match self.language {
            Language::Es => spanish(message),
            Language::En => english(message),
        }
    }

    pub fn results_count(&self, count: usize) -> String {
        match (self.language, count) {
            (Language::Es, 1) => "1 resultado encontrado".to_string(),
            (Language::Es, n) => format!("{n} resultados encontrados"),
            (Language::En, 1) => "1 result found".to_string(),
            (Language::En, n) => format!("{n} results found"),
        }
    }
}

fn spanish(message: Message) -> &'static str {
    match message {
        Message::FetchingResults => "Buscando resultados...",
        Message::SubmittingForm => "Enviando información del paciente...",
        Message::DownloadingPdf => "Descargando PDF",
        Message::NoResults => "No se encontraron resultados.",
        Message::Order => "Orden",
        Message::License => "Licencia",
        Message::Transmitted => "Transmitido",
        Message::PatientSaved => "Información del paciente guardada.",
        Message::PatientCleared => "Información del paciente eliminada.",
        Message::PatientIncomplete => {
            "Faltan datos del paciente: indique apellidos y fecha de nacimiento completa."
        }
        Message::NoPatientInfo => {
            "No hay información del paciente. Guárdela primero con `profile set`."
        }
        Message::InvalidLink => {
            "El enlace no contiene número de control y licencia. Copie el enlace completo del mensaje del laboratorio."
        }
        Message::MissingLookupKey => "Indique el número de control y la licencia del laboratorio.",
        Message::FetchFailed => {
            "No se pudieron obtener los resultados. Verifique su conexión e inténtelo de nuevo."
        }
        Message::PortalRejected => {
            "El portal rechazó la solicitud. Verifique el número de control, la licencia y los datos del paciente."
        }
        Message::PortalTimeout => "El portal no respondió a tiempo. Inténtelo más tarde.",
        Message::PdfFailed => "No se pudo descargar el PDF.",
        Message::NotAPdf => {
            "El portal no devolvió un PDF; es posible que la sesión haya expirado. Vuelva a buscar los resultados."
        }
        Message::SaveFailed => "No se pudo guardar el archivo. Verifique la carpeta de destino.",
        Message::LanguageSaved => "Idioma guardado.",
        Message::UnknownLanguage => "Idioma no soportado. Use `es` o `en`.",
        Message::Generic => "Ocurrió un error inesperado.",
    }
}

fn english(message: Message) -> &'static str {
    match message {
        Message::FetchingResults => "Fetching results...",
        Message::SubmittingForm => "Submitting patient information...",
        Message::DownloadingPdf => "Downloading PDF",
        Message::NoResults => "No results found.",
        Message::Order => "Order",
        Message::License => "License",
        Message::Transmitted => "Transmitted",
        Message::PatientSaved => "Patient information saved.",
        Message::PatientCleared => "Patient information cleared.",
        Message::PatientIncomplete => {
            "Patient information is incomplete: provide last names and a full birth date."
        }
        Message::NoPatientInfo => "No patient information saved. Run `profile set` first.",
        Message::InvalidLink => {
            "The link has no control number and license. Copy the full link from the lab's message."
        }
        Message::MissingLookupKey => "Provide both the control number and the lab license.",
        Message::FetchFailed => "Could not fetch results. Check your connection and try again.",
        Message::PortalRejected => {
            "The portal rejected the request. Check the control number, license and patient details."
        }
        Message::PortalTimeout => "The portal did not answer in time. Try again later.",
        Message::PdfFailed => "Could not download the PDF.",
        Message::NotAPdf => {
            "The portal did not return a PDF; the session may have expired. Fetch the results again."
        }
        Message::SaveFailed => "Could not save the file. Check the output folder.",
        Message::LanguageSaved => "Language saved.",
        Message::UnknownLanguage => "Unsupported language. Use `es` or `en`.",
        Message::Generic => "An unexpected error occurred.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for language in [Language::Es, Language::En] {
            assert_eq!(Language::from_code(language.code()), Some(language));
        }
        assert_eq!(Language::from_code(" EN "), Some(Language::En));
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    fn catalog_defaults_to_spanish() {
        let catalog = Catalog::default();
        assert_eq!(catalog.text(Message::NoResults), "No se encontraron resultados.");
        assert_eq!(catalog.results_count(2), "2 resultados encontrados");
    }

    #[test]
    fn english_catalog_pluralizes() {
        let catalog = Catalog::new(Language::En);
        assert_eq!(catalog.results_count(1), "1 result found");
        assert_eq!(catalog.results_count(3), "3 results found");
    }
}
