// src/services/invoice_service.rs

use crate::{
    common::error::AppError,
    models::invoice::{FatturaElettronica, InvoiceBody, InvoiceLine, Seat, Supplier},
    services::export_service::{decimal_comma, finish, semicolon_writer},
};

const LINE_HEADERS: [&str; 8] = [
    "Codice",
    "Descrizione",
    "Quantità",
    "Prezzo unitario",
    "Unità di misura",
    "Sconto",
    "IVA",
    "Totale",
];

/// Só aceita arquivos com extensão .xml / .XML.
pub fn check_extension(filename: &str) -> Result<(), AppError> {
    if filename.ends_with(".xml") || filename.ends_with(".XML") {
        Ok(())
    } else {
        Err(AppError::InvalidInvoice(format!("extensão não suportada: {filename}")))
    }
}

pub fn parse_invoice(bytes: &[u8]) -> Result<FatturaElettronica, AppError> {
    let text = std::str::from_utf8(bytes).map_err(|e| AppError::InvalidInvoice(e.to_string()))?;
    quick_xml::de::from_str(text).map_err(|e| AppError::InvalidInvoice(e.to_string()))
}

/// Valida a extensão, lê o XML e gera o CSV normalizado.
pub fn invoice_to_csv(filename: &str, bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    check_extension(filename)?;
    let invoice = parse_invoice(bytes)?;
    render_csv(&invoice)
}

pub fn render_csv(invoice: &FatturaElettronica) -> Result<Vec<u8>, AppError> {
    let body = invoice
        .bodies
        .first()
        .ok_or_else(|| AppError::InvalidInvoice("FatturaElettronicaBody ausente".to_string()))?;
    let document = &body.general.document;

    let mut writer = semicolon_writer();

    writer.write_record(["Data documento", document.date.as_str()])?;
    writer.write_record(["Numero documento", document.number.as_str()])?;
    writer.write_record(["Tipologia documento", document.kind.as_str()])?;
    for (label, value) in supplier_rows(&invoice.header.supplier) {
        writer.write_record([label, value.as_str()])?;
    }

    writer.write_record(["", ""])?;
    writer.write_record(LINE_HEADERS)?;
    for line in &body.goods.lines {
        writer.write_record(line_record(line))?;
    }

    writer.write_record(["", ""])?;
    for summary in &body.goods.summaries {
        writer.write_record(["Aliquota IVA", decimal_comma(&summary.vat_rate).as_str()])?;
        writer.write_record(["Totale imponibile", decimal_comma(&summary.taxable).as_str()])?;
        writer.write_record(["Totale imposta", decimal_comma(&summary.tax).as_str()])?;
        writer.write_record(["", ""])?;
    }

    let total = document.total.as_deref().map(decimal_comma).unwrap_or_default();
    writer.write_record(["Totale documento", total.as_str()])?;

    if let Some((method, due_date)) = first_payment(body) {
        writer.write_record(["Modalità di pagamento", method])?;
        writer.write_record(["Data di scadenza", due_date])?;
    }

    finish(writer)
}

fn supplier_rows(supplier: &Supplier) -> Vec<(&'static str, String)> {
    let registry = &supplier.registry;
    let no_seat = Seat::default();
    let seat = supplier.seat.as_ref().unwrap_or(&no_seat);

    let city = seat.city.clone().unwrap_or_default();
    let city = match seat.province.as_deref() {
        Some(province) => format!("{city} ({province})"),
        None => city,
    };

    vec![
        ("Identificativo fiscale", format!("{}{}", registry.vat_id.country, registry.vat_id.code)),
        (
            "Codice fiscale",
            registry.tax_code.clone().unwrap_or_else(|| registry.vat_id.code.clone()),
        ),
        ("Denominazione", registry.names.display()),
        ("Regime fiscale", registry.tax_regime.clone().unwrap_or_default()),
        ("Indirizzo", seat.address.clone().unwrap_or_default()),
        ("Comune", city),
        ("CAP", seat.cap.clone().unwrap_or_default()),
        ("Nazione", seat.country.clone().unwrap_or_default()),
    ]
}

fn line_record(line: &InvoiceLine) -> Vec<String> {
    let code = line
        .codes
        .iter()
        .map(|code| format!("{} ({})", code.value, code.kind))
        .collect::<Vec<_>>()
        .join(" ");
    let discount = line
        .discounts
        .iter()
        .filter_map(|d| d.percentage.as_deref())
        .map(decimal_comma)
        .collect::<Vec<_>>()
        .join(" ");

    vec![
        code,
        line.description.clone(),
        line.quantity.as_deref().map(decimal_comma).unwrap_or_default(),
        decimal_comma(&line.unit_price),
        line.unit.clone().unwrap_or_default(),
        discount,
        decimal_comma(&line.vat_rate),
        decimal_comma(&line.total_price),
    ]
}

fn first_payment(body: &InvoiceBody) -> Option<(&str, &str)> {
    let detail = body.payments.iter().flat_map(|p| p.details.iter()).next()?;
    Some((detail.method.as_str(), detail.due_date.as_deref().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:FatturaElettronica versione="FPR12" xmlns:p="http://ivaservizi.agenziaentrate.gov.it/docs/xsd/fatture/v1.2">
  <FatturaElettronicaHeader>
    <DatiTrasmissione><ProgressivoInvio>00001</ProgressivoInvio></DatiTrasmissione>
    <CedentePrestatore>
      <DatiAnagrafici>
        <IdFiscaleIVA><IdPaese>IT</IdPaese><IdCodice>01234567890</IdCodice></IdFiscaleIVA>
        <Anagrafica><Denominazione>Forniture Srl</Denominazione></Anagrafica>
        <RegimeFiscale>RF01</RegimeFiscale>
      </DatiAnagrafici>
      <Sede>
        <Indirizzo>Via Roma 1</Indirizzo>
        <CAP>38068</CAP>
        <Comune>Rovereto</Comune>
        <Provincia>TN</Provincia>
        <Nazione>IT</Nazione>
      </Sede>
    </CedentePrestatore>
  </FatturaElettronicaHeader>
  <FatturaElettronicaBody>
    <DatiGenerali>
      <DatiGeneraliDocumento>
        <TipoDocumento>TD01</TipoDocumento>
        <Divisa>EUR</Divisa>
        <Data>2024-03-15</Data>
        <Numero>42</Numero>
        <ImportoTotaleDocumento>146.40</ImportoTotaleDocumento>
      </DatiGeneraliDocumento>
    </DatiGenerali>
    <DatiBeniServizi>
      <DettaglioLinee>
        <NumeroLinea>1</NumeroLinea>
        <CodiceArticolo><CodiceTipo>INTERNO</CodiceTipo><CodiceValore>ABC-1</CodiceValore></CodiceArticolo>
        <Descrizione>Cuscinetto</Descrizione>
        <Quantita>2.00</Quantita>
        <UnitaMisura>PZ</UnitaMisura>
        <PrezzoUnitario>50.00</PrezzoUnitario>
        <ScontoMaggiorazione><Tipo>SC</Tipo><Percentuale>10.00</Percentuale></ScontoMaggiorazione>
        <PrezzoTotale>90.00</PrezzoTotale>
        <AliquotaIVA>22.00</AliquotaIVA>
      </DettaglioLinee>
      <DettaglioLinee>
        <NumeroLinea>2</NumeroLinea>
        <Descrizione>Trasporto</Descrizione>
        <PrezzoUnitario>30.00</PrezzoUnitario>
        <PrezzoTotale>30.00</PrezzoTotale>
        <AliquotaIVA>22.00</AliquotaIVA>
      </DettaglioLinee>
      <DatiRiepilogo>
        <AliquotaIVA>22.00</AliquotaIVA>
        <ImponibileImporto>120.00</ImponibileImporto>
        <Imposta>26.40</Imposta>
      </DatiRiepilogo>
    </DatiBeniServizi>
    <DatiPagamento>
      <CondizioniPagamento>TP02</CondizioniPagamento>
      <DettaglioPagamento>
        <ModalitaPagamento>MP05</ModalitaPagamento>
        <DataScadenzaPagamento>2024-04-15</DataScadenzaPagamento>
        <ImportoPagamento>146.40</ImportoPagamento>
      </DettaglioPagamento>
    </DatiPagamento>
  </FatturaElettronicaBody>
</p:FatturaElettronica>"#;

    fn csv_lines() -> Vec<String> {
        let bytes = invoice_to_csv("fattura.xml", SAMPLE.as_bytes()).unwrap();
        String::from_utf8(bytes).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn header_block_describes_supplier() {
        let lines = csv_lines();
        assert_eq!(lines[0], "Data documento;2024-03-15");
        assert_eq!(lines[1], "Numero documento;42");
        assert_eq!(lines[2], "Tipologia documento;TD01");
        assert_eq!(lines[3], "Identificativo fiscale;IT01234567890");
        assert_eq!(lines[4], "Codice fiscale;01234567890");
        assert_eq!(lines[5], "Denominazione;Forniture Srl");
        assert_eq!(lines[8], "Comune;Rovereto (TN)");
        assert_eq!(lines[9], "CAP;38068");
    }

    #[test]
    fn lines_use_decimal_comma() {
        let lines = csv_lines();
        let header = lines.iter().position(|l| l.starts_with("Codice;Descrizione")).unwrap();
        assert_eq!(lines[header + 1], "ABC-1 (INTERNO);Cuscinetto;2,00;50,00;PZ;10,00;22,00;90,00");
        assert_eq!(lines[header + 2], ";Trasporto;;30,00;;;22,00;30,00");
    }

    #[test]
    fn totals_and_payment_close_the_file() {
        let lines = csv_lines();
        assert!(lines.contains(&"Totale imponibile;120,00".to_string()));
        assert!(lines.contains(&"Totale imposta;26,40".to_string()));
        assert!(lines.contains(&"Totale documento;146,40".to_string()));
        assert_eq!(lines[lines.len() - 2], "Modalità di pagamento;MP05");
        assert_eq!(lines[lines.len() - 1], "Data di scadenza;2024-04-15");
    }

    #[test]
    fn wrong_extension_is_rejected() {
        assert!(matches!(
            invoice_to_csv("fattura.pdf", SAMPLE.as_bytes()),
            Err(AppError::InvalidInvoice(_))
        ));
    }

    #[test]
    fn malformed_xml_is_a_client_error() {
        let err = invoice_to_csv("rotta.XML", b"<FatturaElettronica><oops>").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
