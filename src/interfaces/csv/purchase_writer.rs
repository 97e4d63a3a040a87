use crate::domain::purchase::Purchase;
use crate::error::{PortalError, Result};
use serde::Serialize;
use std::io::Write;

/// One exported row per purchase.
#[derive(Serialize)]
struct PurchaseRow<'a> {
    id: &'a str,
    created_at: String,
    status: String,
    product: &'a str,
    quantity: u32,
    unit_price: String,
    total: String,
    buyer_name: &'a str,
    buyer_email: &'a str,
    submission: &'a str,
    payment_reference: &'a str,
}

impl<'a> From<&'a Purchase> for PurchaseRow<'a> {
    fn from(purchase: &'a Purchase) -> Self {
        Self {
            id: purchase.id.as_str(),
            created_at: purchase.created_at.to_rfc3339(),
            status: purchase.status.to_string(),
            product: &purchase.product_name,
            quantity: purchase.quantity,
            unit_price: purchase.unit_price.to_string(),
            total: purchase.total.to_string(),
            buyer_name: &purchase.buyer.name,
            buyer_email: &purchase.buyer.email,
            submission: purchase.submission_id.as_ref().map_or("", |id| id.as_str()),
            payment_reference: purchase.payment_reference.as_deref().unwrap_or(""),
        }
    }
}

/// Writes purchases as CSV for the admin export.
pub struct PurchaseWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PurchaseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_purchases<'a, I>(&mut self, purchases: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Purchase>,
    {
        for purchase in purchases {
            self.writer.serialize(PurchaseRow::from(purchase))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| PortalError::IoError(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::tests::hoodie;
    use crate::domain::purchase::Buyer;

    #[test]
    fn test_writes_header_and_rows() {
        let buyer = Buyer::new("Ada Lovelace", "ada@school.example.org").unwrap();
        let mut purchase = Purchase::new(&hoodie(10), 2, buyer, None).unwrap();
        purchase.mark_paid(Some("pay_42".to_string())).unwrap();

        let mut writer = PurchaseWriter::new(Vec::new());
        writer.write_purchases([&purchase]).unwrap();
        let output = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,created_at,status,product,quantity,unit_price,total,buyer_name,buyer_email,submission,payment_reference"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with(purchase.id.as_str()));
        assert!(row.contains(",paid,ASB Hoodie,2,35.00,70.00,Ada Lovelace,ada@school.example.org,,pay_42"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let mut writer = PurchaseWriter::new(Vec::new());
        writer.write_purchases(std::iter::empty()).unwrap();
        assert!(writer.into_inner().unwrap().is_empty());
    }
}
