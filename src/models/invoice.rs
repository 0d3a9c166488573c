// src/models/invoice.rs

// Subconjunto da FatturaPA (fatura eletrônica italiana) lido no upload.
// Só os campos que vão para o CSV; o resto do XML é ignorado.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FatturaElettronica {
    #[serde(rename = "FatturaElettronicaHeader")]
    pub header: InvoiceHeader,
    // Um arquivo pode trazer um lote de corpos; exportamos o primeiro
    #[serde(rename = "FatturaElettronicaBody", default)]
    pub bodies: Vec<InvoiceBody>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceHeader {
    #[serde(rename = "CedentePrestatore")]
    pub supplier: Supplier,
}

#[derive(Debug, Deserialize)]
pub struct Supplier {
    #[serde(rename = "DatiAnagrafici")]
    pub registry: SupplierRegistry,
    #[serde(rename = "Sede", default)]
    pub seat: Option<Seat>,
}

#[derive(Debug, Deserialize)]
pub struct SupplierRegistry {
    #[serde(rename = "IdFiscaleIVA")]
    pub vat_id: VatId,
    #[serde(rename = "CodiceFiscale", default)]
    pub tax_code: Option<String>,
    #[serde(rename = "Anagrafica")]
    pub names: Names,
    #[serde(rename = "RegimeFiscale", default)]
    pub tax_regime: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VatId {
    #[serde(rename = "IdPaese")]
    pub country: String,
    #[serde(rename = "IdCodice")]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct Names {
    #[serde(rename = "Denominazione", default)]
    pub company_name: Option<String>,
    #[serde(rename = "Nome", default)]
    pub first_name: Option<String>,
    #[serde(rename = "Cognome", default)]
    pub last_name: Option<String>,
}

impl Names {
    /// Pessoa jurídica usa a denominação; pessoa física, "Nome Cognome".
    pub fn display(&self) -> String {
        match &self.company_name {
            Some(name) => name.clone(),
            None => [self.first_name.as_deref(), self.last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Seat {
    #[serde(rename = "Indirizzo", default)]
    pub address: Option<String>,
    #[serde(rename = "CAP", default)]
    pub cap: Option<String>,
    #[serde(rename = "Comune", default)]
    pub city: Option<String>,
    #[serde(rename = "Provincia", default)]
    pub province: Option<String>,
    #[serde(rename = "Nazione", default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceBody {
    #[serde(rename = "DatiGenerali")]
    pub general: GeneralData,
    #[serde(rename = "DatiBeniServizi")]
    pub goods: GoodsAndServices,
    #[serde(rename = "DatiPagamento", default)]
    pub payments: Vec<PaymentData>,
}

#[derive(Debug, Deserialize)]
pub struct GeneralData {
    #[serde(rename = "DatiGeneraliDocumento")]
    pub document: DocumentData,
}

#[derive(Debug, Deserialize)]
pub struct DocumentData {
    #[serde(rename = "TipoDocumento")]
    pub kind: String,
    #[serde(rename = "Data")]
    pub date: String,
    #[serde(rename = "Numero")]
    pub number: String,
    #[serde(rename = "ImportoTotaleDocumento", default)]
    pub total: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoodsAndServices {
    #[serde(rename = "DettaglioLinee", default)]
    pub lines: Vec<InvoiceLine>,
    #[serde(rename = "DatiRiepilogo", default)]
    pub summaries: Vec<VatSummary>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceLine {
    #[serde(rename = "CodiceArticolo", default)]
    pub codes: Vec<ArticleCode>,
    #[serde(rename = "Descrizione")]
    pub description: String,
    #[serde(rename = "Quantita", default)]
    pub quantity: Option<String>,
    #[serde(rename = "UnitaMisura", default)]
    pub unit: Option<String>,
    #[serde(rename = "PrezzoUnitario")]
    pub unit_price: String,
    #[serde(rename = "ScontoMaggiorazione", default)]
    pub discounts: Vec<Discount>,
    #[serde(rename = "PrezzoTotale")]
    pub total_price: String,
    #[serde(rename = "AliquotaIVA")]
    pub vat_rate: String,
}

#[derive(Debug, Deserialize)]
pub struct ArticleCode {
    #[serde(rename = "CodiceTipo")]
    pub kind: String,
    #[serde(rename = "CodiceValore")]
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct Discount {
    #[serde(rename = "Percentuale", default)]
    pub percentage: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VatSummary {
    #[serde(rename = "AliquotaIVA")]
    pub vat_rate: String,
    #[serde(rename = "ImponibileImporto")]
    pub taxable: String,
    #[serde(rename = "Imposta")]
    pub tax: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentData {
    #[serde(rename = "DettaglioPagamento", default)]
    pub details: Vec<PaymentDetail>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentDetail {
    #[serde(rename = "ModalitaPagamento")]
    pub method: String,
    #[serde(rename = "DataScadenzaPagamento", default)]
    pub due_date: Option<String>,
}
