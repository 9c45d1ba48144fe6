use super::envelope::{date, id, is_set, number, text, unwrap_list};
use super::status::{BillingCycle, ContractStatus};
use super::{ContractInvoice, MaintenanceContract};
use serde_json::Value;

pub fn contract(value: &Value) -> Option<MaintenanceContract> {
    let id = id(value)?;
    let raw_status = text(value, &["status"]).unwrap_or_default();
    let status = ContractStatus::parse(&raw_status);
    let invoices = value
        .get("invoices")
        .map(|list| unwrap_list(list, &["data"]))
        .unwrap_or_default()
        .iter()
        .filter_map(invoice)
        .collect();

    Some(MaintenanceContract {
        contract_number: text(value, &["contract_number", "number", "reference"])
            .unwrap_or_else(|| id.clone()),
        id,
        pack: pack_name(value),
        billing_cycle: BillingCycle::parse(
            &text(value, &["billing_cycle", "billing", "frequency"]).unwrap_or_default(),
        ),
        price: number(value, &["price", "price_ttc", "amount", "monthly_price"]),
        status,
        status_label: status.label(&raw_status),
        next_billing_date: date(value, &["next_billing_date", "next_invoice_date"]),
        start_date: date(value, &["start_date", "started_at", "created_at"]),
        invoices,
    })
}

pub fn invoice(value: &Value) -> Option<ContractInvoice> {
    let id = id(value)?;
    let paid = text(value, &["status"]).is_some_and(|s| s.eq_ignore_ascii_case("paid"))
        || is_set(value, &["paid_at", "paid"]);

    Some(ContractInvoice {
        id,
        amount: number(value, &["amount", "total_ttc", "total"]),
        paid,
        due_date: date(value, &["due_date", "date"]),
        paid_at: date(value, &["paid_at"]),
        pay_url: if paid {
            None
        } else {
            text(value, &["payment_link", "payment_url", "pay_url"])
        },
    })
}

/// Pack name, whether sent as a string or as a nested `{name}` object.
fn pack_name(value: &Value) -> String {
    ["pack", "plan"]
        .iter()
        .find_map(|key| match value.get(key)? {
            Value::Object(_) => text(&value[key], &["name", "label"]),
            _ => text(value, &[*key]),
        })
        .or_else(|| text(value, &["pack_name"]))
        .unwrap_or_default()
}
