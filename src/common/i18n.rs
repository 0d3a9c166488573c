// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "it";

// Catálogo italiano (idioma padrão da operação)
const IT: &[(&str, &str)] = &[
    ("validation.failed", "Uno o più campi non sono validi."),
    ("validation.required", "Campo obbligatorio."),
    ("validation.file_too_large", "Il file supera la dimensione massima consentita."),
    ("validation.email", "Indirizzo email non valido."),
    ("validation.duration", "Durata non valida."),
    ("validation.password_length", "La password deve avere almeno 8 caratteri."),
    ("input.invalid_date", "Data non valida: {0}."),
    ("input.invalid_month", "Mese non valido: {0} (formato MM/AAAA)."),
    ("input.conflicting_period", "Indicare un mese oppure un intervallo, non entrambi."),
    ("input.invalid_work_reference", "Macchina o commessa inesistente: {0}."),
    ("input.invalid_supervisor", "Supervisore inesistente: {0}."),
    ("auth.invalid_credentials", "Username o password errati."),
    ("auth.invalid_token", "Token non valido o scaduto."),
    ("auth.forbidden", "Non sei autorizzato a fare questa operazione."),
    ("auth.wrong_password", "La password attuale non è corretta."),
    ("not_found.user", "Utente non trovato."),
    ("not_found.client", "Cliente non trovato."),
    ("not_found.plant", "Stabilimento non trovato."),
    ("not_found.machine", "Macchina non trovata."),
    ("not_found.commission", "Commessa non trovata."),
    ("not_found.report", "Intervento non trovato."),
    ("conflict.username", "Username già registrato."),
    ("conflict.email", "Email già registrata."),
    ("conflict.client_name", "Cliente già registrato."),
    ("conflict.commission_code", "Codice commessa già registrato."),
    ("delete_blocked.client_has_plants", "Impossibile eliminare il cliente: ha stabilimenti associati."),
    ("delete_blocked.client_has_open_commissions", "Impossibile eliminare il cliente: ha commesse aperte."),
    ("delete_blocked.client_has_closed_commissions", "Impossibile eliminare il cliente: ha commesse chiuse."),
    ("delete_blocked.plant_has_machines", "Impossibile eliminare lo stabilimento: ha macchine associate."),
    ("delete_blocked.machine_has_reports", "Impossibile eliminare la macchina: ha interventi associati."),
    ("delete_blocked.commission_has_reports", "Impossibile eliminare la commessa: ha interventi associati."),
    ("delete_blocked.user_has_reports", "Impossibile eliminare l'utente: ha interventi associati."),
    ("user.cannot_delete", "Non puoi eliminare questo utente."),
    ("invoice.invalid", "Errore nella lettura della fattura."),
    ("internal.error", "Si è verificato un errore imprevisto."),
];

const EN: &[(&str, &str)] = &[
    ("validation.failed", "One or more fields are invalid."),
    ("validation.required", "Required field."),
    ("validation.file_too_large", "The file exceeds the maximum allowed size."),
    ("validation.email", "Invalid email address."),
    ("validation.duration", "Invalid duration."),
    ("validation.password_length", "Password must be at least 8 characters long."),
    ("input.invalid_date", "Invalid date: {0}."),
    ("input.invalid_month", "Invalid month: {0} (expected MM/YYYY)."),
    ("input.conflicting_period", "Give either a month or an interval, not both."),
    ("input.invalid_work_reference", "Machine or commission does not exist: {0}."),
    ("input.invalid_supervisor", "Supervisor does not exist: {0}."),
    ("auth.invalid_credentials", "Wrong username or password."),
    ("auth.invalid_token", "Invalid or expired token."),
    ("auth.forbidden", "You are not allowed to perform this operation."),
    ("auth.wrong_password", "The current password is wrong."),
    ("not_found.user", "User not found."),
    ("not_found.client", "Client not found."),
    ("not_found.plant", "Plant not found."),
    ("not_found.machine", "Machine not found."),
    ("not_found.commission", "Commission not found."),
    ("not_found.report", "Report not found."),
    ("conflict.username", "Username already registered."),
    ("conflict.email", "Email already registered."),
    ("conflict.client_name", "Client already registered."),
    ("conflict.commission_code", "Commission code already registered."),
    ("delete_blocked.client_has_plants", "Cannot delete the client: it still has plants."),
    ("delete_blocked.client_has_open_commissions", "Cannot delete the client: it still has open commissions."),
    ("delete_blocked.client_has_closed_commissions", "Cannot delete the client: it still has closed commissions."),
    ("delete_blocked.plant_has_machines", "Cannot delete the plant: it still has machines."),
    ("delete_blocked.machine_has_reports", "Cannot delete the machine: it has reports."),
    ("delete_blocked.commission_has_reports", "Cannot delete the commission: it has reports."),
    ("delete_blocked.user_has_reports", "Cannot delete the user: it is referenced by reports."),
    ("user.cannot_delete", "You cannot delete this user."),
    ("invoice.invalid", "Could not read the invoice."),
    ("internal.error", "An unexpected error occurred."),
];

/// Catálogos de mensagens carregados uma vez na inicialização.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("it", IT.iter().copied().collect());
        catalogs.insert("en", EN.iter().copied().collect());
        Self { catalogs }
    }

    /// Busca a chave no idioma pedido, depois no padrão; em último caso devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|catalog| catalog.get(key)))
            .map(|message| message.to_string())
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translate_with(&self, lang: &str, key: &str, arg: &str) -> String {
        self.translate(lang, key).replace("{0}", arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_language() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "not_found.report"), "Intervento non trovato.");
    }

    #[test]
    fn unknown_key_is_returned_as_is() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "does.not.exist"), "does.not.exist");
    }

    #[test]
    fn catalogs_have_the_same_keys() {
        let it: Vec<_> = IT.iter().map(|(k, _)| *k).collect();
        let en: Vec<_> = EN.iter().map(|(k, _)| *k).collect();
        assert_eq!(it, en);
    }
}
