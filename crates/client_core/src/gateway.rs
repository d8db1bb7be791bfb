use chrono::NaiveDateTime;
use shared::{domain::OrderId, protocol::ConfirmPaymentRequest};

pub const SUCCESS_CODE: &str = "00";

const PAY_DATE_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayReturnParams {
    pub order_ref: Option<String>,
    pub response_code: Option<String>,
    pub transaction_status: Option<String>,
    pub transaction_no: Option<String>,
    pub pay_date: Option<String>,
}

impl GatewayReturnParams {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.contains("://") {
            if let Ok(url) = url::Url::parse(input) {
                return Self::from_query(url.query().unwrap_or_default());
            }
        }
        let query = match input.split_once('?') {
            Some((_, query)) => query,
            None => input,
        };
        Self::from_query(query)
    }

    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        let mut fallback_order_ref = None;

        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let value = Some(value.to_string());
            match key.as_ref() {
                "vnp_TxnRef" => params.order_ref = value,
                "order_id" => fallback_order_ref = value,
                "vnp_ResponseCode" => params.response_code = value,
                "vnp_TransactionStatus" => params.transaction_status = value,
                "vnp_TransactionNo" => params.transaction_no = value,
                "vnp_PayDate" => params.pay_date = value,
                _ => {}
            }
        }

        if params.order_ref.is_none() {
            params.order_ref = fallback_order_ref;
        }
        params
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_ref
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(OrderId)
    }

    pub fn has_gateway_status(&self) -> bool {
        self.response_code.is_some() || self.transaction_status.is_some()
    }

    pub fn failing_code(&self) -> Option<&str> {
        [&self.response_code, &self.transaction_status]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|code| *code != SUCCESS_CODE)
    }

    pub fn confirmation_request(&self, order_id: OrderId) -> Option<ConfirmPaymentRequest> {
        let transaction_no = positive_number(self.transaction_no.as_deref()?)?;
        let pay_date = positive_number(self.pay_date.as_deref()?)?;
        Some(ConfirmPaymentRequest {
            order_id,
            transaction_no,
            pay_date,
        })
    }

    pub fn paid_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.pay_date.as_deref()?, PAY_DATE_FORMAT).ok()
    }
}

/// Parses `raw` as a finite number greater than zero. Plain digit strings
/// stay exact integers.
pub fn positive_number(raw: &str) -> Option<serde_json::Number> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(value) = raw.parse::<u64>() {
            return (value > 0).then(|| serde_json::Number::from(value));
        }
    }

    let value = raw.parse::<f64>().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    if value.fract() == 0.0 && value < u64::MAX as f64 {
        return Some(serde_json::Number::from(value as u64));
    }
    serde_json::Number::from_f64(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const SUCCESS_QUERY: &str = "vnp_Amount=15000000&vnp_TxnRef=42&vnp_ResponseCode=00\
        &vnp_TransactionStatus=00&vnp_TransactionNo=14226112&vnp_PayDate=20240315103045";

    #[test]
    fn parses_vnpay_query() {
        let params = GatewayReturnParams::parse(SUCCESS_QUERY);
        assert_eq!(params.order_id(), Some(OrderId(42)));
        assert_eq!(params.response_code.as_deref(), Some("00"));
        assert_eq!(params.failing_code(), None);
        assert!(params.has_gateway_status());
    }

    #[test]
    fn parses_full_redirect_url() {
        let url = format!("https://shop.example/payment/return?{SUCCESS_QUERY}");
        assert_eq!(
            GatewayReturnParams::parse(&url),
            GatewayReturnParams::parse(SUCCESS_QUERY)
        );
        assert_eq!(
            GatewayReturnParams::parse(&format!("?{SUCCESS_QUERY}")),
            GatewayReturnParams::parse(SUCCESS_QUERY)
        );
    }

    #[test]
    fn order_id_falls_back_and_txn_ref_wins() {
        let only_fallback = GatewayReturnParams::parse("order_id=17");
        assert_eq!(only_fallback.order_id(), Some(OrderId(17)));
        assert!(!only_fallback.has_gateway_status());

        let both = GatewayReturnParams::parse("order_id=17&vnp_TxnRef=18");
        assert_eq!(both.order_id(), Some(OrderId(18)));
    }

    #[test]
    fn rejects_unusable_order_refs() {
        for query in ["", "vnp_TxnRef=", "vnp_TxnRef=abc", "vnp_TxnRef=-4", "vnp_TxnRef=0"] {
            assert_eq!(GatewayReturnParams::parse(query).order_id(), None, "{query}");
        }
    }

    #[test]
    fn failing_code_checks_transaction_status_too() {
        let params = GatewayReturnParams::parse(
            "vnp_TxnRef=1&vnp_ResponseCode=00&vnp_TransactionStatus=02",
        );
        assert_eq!(params.failing_code(), Some("02"));

        let params = GatewayReturnParams::parse("vnp_TxnRef=1&vnp_ResponseCode=24");
        assert_eq!(params.failing_code(), Some("24"));
    }

    #[test]
    fn positive_number_rules() {
        assert_eq!(positive_number("14226112"), Some(serde_json::Number::from(14_226_112_u64)));
        assert_eq!(positive_number("1e3"), Some(serde_json::Number::from(1000_u64)));
        assert!(positive_number("2.5").is_some());
        for bad in ["NaN", "inf", "-1", "0", "0.0", "", "12ab"] {
            assert_eq!(positive_number(bad), None, "{bad}");
        }
    }

    #[test]
    fn confirmation_request_requires_both_numbers() {
        let params = GatewayReturnParams::parse(SUCCESS_QUERY);
        let request = params.confirmation_request(OrderId(42)).expect("valid");
        assert_eq!(request.transaction_no, serde_json::Number::from(14_226_112_u64));

        let missing_date =
            GatewayReturnParams::parse("vnp_TxnRef=42&vnp_ResponseCode=00&vnp_TransactionNo=5");
        assert!(missing_date.confirmation_request(OrderId(42)).is_none());

        let nan = GatewayReturnParams::parse(
            "vnp_TxnRef=42&vnp_ResponseCode=00&vnp_TransactionNo=NaN&vnp_PayDate=20240315103045",
        );
        assert!(nan.confirmation_request(OrderId(42)).is_none());
    }

    #[test]
    fn paid_at_decodes_gateway_timestamp() {
        let paid_at = GatewayReturnParams::parse(SUCCESS_QUERY)
            .paid_at()
            .expect("timestamp");
        assert_eq!((paid_at.year(), paid_at.month(), paid_at.day()), (2024, 3, 15));
        assert_eq!((paid_at.hour(), paid_at.minute(), paid_at.second()), (10, 30, 45));
    }
}
