//! Fixtures shared by more than one crate's test suite: sample CSV bytes and
//! an `Invoice` builder with sane defaults so scenario tests stay short.

use chrono::NaiveDate;
use recon_core::model::{Invoice, InvoiceStatus};
use uuid::Uuid;

pub fn sample_csv() -> &'static str {
    "transaction_date,description,amount,reference_number\n\
     2024-12-10,SARAH ADAMS,1250.00,REF-001\n\
     2024-12-08,ADAMS SARAH,1250.00,\n\
     2024-12-10,DEPOSIT S ADAMS,1250.00,REF-002\n"
}

pub struct InvoiceBuilder {
    invoice: Invoice,
}

impl InvoiceBuilder {
    pub fn new(customer_name: &str, amount: &str, due: &str) -> Self {
        Self {
            invoice: Invoice {
                id: Uuid::new_v4(),
                invoice_number: format!("INV-{}", &Uuid::new_v4().to_string()[..8]),
                customer_name: customer_name.to_string(),
                amount: amount.to_string(),
                due_date: NaiveDate::parse_from_str(due, "%Y-%m-%d").unwrap(),
                status: InvoiceStatus::Sent,
                paid_at: None,
            },
        }
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        self.invoice.status = status;
        self
    }

    pub fn paid(mut self) -> Self {
        self.invoice.paid_at = Some(chrono::Utc::now());
        self.invoice.status = InvoiceStatus::Paid;
        self
    }

    pub fn build(self) -> Invoice {
        self.invoice
    }
}
