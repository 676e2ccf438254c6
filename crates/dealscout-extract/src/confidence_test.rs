use std::str::FromStr;

use super::*;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ai(original: Option<&str>, sale: &str, confidence: u8) -> AiProduct {
    AiProduct {
        name: "Wool Coat".to_string(),
        brand: None,
        image_url: "https://cdn.site.com/a.jpg".to_string(),
        original_price: original.map(dec),
        sale_price: dec(sale),
        confidence,
    }
}

const SOURCE: &str = "https://site.com/p/wool-coat";

#[test]
fn literal_forms_cover_common_renderings() {
    let forms = price_literal_forms(dec("1299"));
    for expected in ["1299", "1,299.00", "1299.00", "129900"] {
        assert!(forms.contains(&expected.to_string()), "missing {expected}: {forms:?}");
    }

    let forms = price_literal_forms(dec("49.99"));
    assert!(forms.contains(&"49.99".to_string()));
    assert!(forms.contains(&"4999".to_string()));
    assert!(forms.contains(&"50".to_string()));
}

#[test]
fn hallucinated_price_costs_exactly_twenty() {
    let html = "<html><span class=\"price\">$39.00</span></html>";
    let assessed = assess(
        &ai(None, "49.99", 80),
        None,
        html,
        SOURCE,
        ConfidenceThresholds::default(),
    )
    .unwrap();
    assert_eq!(assessed.candidate.confidence, 60);
    assert!(assessed.notes.iter().any(|n| n.contains("not found")));
}

#[test]
fn price_present_in_any_form_keeps_confidence() {
    for html in ["$49.99", "\"price\": 4999", "only about $50 today"] {
        let assessed = assess(
            &ai(None, "49.99", 80),
            None,
            html,
            SOURCE,
            ConfidenceThresholds::default(),
        )
        .unwrap();
        assert_eq!(assessed.candidate.confidence, 80, "{html}");
    }
}

#[test]
fn inverted_prices_are_nulled_and_penalized() {
    let html = "<span>$80</span><s>$50</s>";
    let assessed = assess(
        &ai(Some("50"), "80", 85),
        None,
        html,
        SOURCE,
        ConfidenceThresholds::default(),
    )
    .unwrap();
    let candidate = assessed.candidate;
    assert_eq!(candidate.original_price(), None);
    assert_eq!(candidate.percent_off(), 0);
    assert_eq!(candidate.sale_price(), dec("80"));
    assert!(85 - candidate.confidence >= 20);
}

#[test]
fn inverted_penalty_respects_floor() {
    let (_, confidence, _) = sanitize_price_pair(Some(dec("10")), dec("10"), 45);
    assert_eq!(confidence, 30);
    let (_, confidence, _) = sanitize_price_pair(Some(dec("10")), dec("10"), 25);
    assert_eq!(confidence, 25);
    let (pair, confidence, note) = sanitize_price_pair(Some(dec("20")), dec("10"), 70);
    assert_eq!(confidence, 70);
    assert_eq!(pair.original(), Some(dec("20")));
    assert!(note.is_none());
}

#[test]
fn ground_truth_overrides_oracle_prices() {
    let truth = PricePair::new(Some(dec("60.00")), dec("39.00"));
    // The oracle invents prices that are nowhere in the page.
    let assessed = assess(
        &ai(Some("999"), "555", 55),
        Some(truth),
        "<html>no prices</html>",
        SOURCE,
        ConfidenceThresholds::default(),
    )
    .unwrap();
    assert_eq!(assessed.candidate.sale_price(), dec("39.00"));
    assert_eq!(assessed.candidate.original_price(), Some(dec("60.00")));
    assert_eq!(assessed.candidate.percent_off(), 35);
    assert_eq!(assessed.candidate.confidence, 88);
}

#[test]
fn ground_truth_keeps_higher_oracle_confidence() {
    let truth = PricePair::sale_only(dec("39.00"));
    let assessed = assess(
        &ai(None, "39", 93),
        Some(truth),
        "",
        SOURCE,
        ConfidenceThresholds::default(),
    )
    .unwrap();
    assert_eq!(assessed.candidate.confidence, 93);
}

#[test]
fn below_minimum_is_a_low_confidence_error() {
    let err = assess(
        &ai(None, "49.99", 60),
        None,
        "<html></html>",
        SOURCE,
        ConfidenceThresholds::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ExtractError::LowConfidence {
            confidence: 40,
            minimum: 50
        }
    ));
}

#[test]
fn thresholds_are_configurable() {
    let thresholds = ConfidenceThresholds {
        accept: 30,
        minimum: 20,
    };
    let assessed = assess(&ai(None, "49.99", 60), None, "", SOURCE, thresholds).unwrap();
    assert_eq!(assessed.candidate.confidence, 40);
}

#[test]
fn placeholder_hosts_are_detected() {
    assert!(is_placeholder_image("https://via.placeholder.com/300"));
    assert!(is_placeholder_image("https://PLACEHOLD.CO/600x400"));
    assert!(!is_placeholder_image("https://images.example.com/x.jpg"));
    assert!(!is_placeholder_image("https://cdn.shopify.com/s/files/a.jpg"));
    assert!(!is_placeholder_image("not a url"));
}

#[test]
fn placeholder_image_fails_assessment() {
    let mut product = ai(None, "20", 90);
    product.image_url = "https://dummyimage.com/600x400".to_string();
    let err = assess(&product, None, "$20", SOURCE, ConfidenceThresholds::default()).unwrap_err();
    assert!(matches!(err, ExtractError::PlaceholderImage { .. }));
}

#[test]
fn standalone_check_reports_penalty() {
    let (confidence, note) = hallucination_check(dec("12.50"), "<p>$12.50</p>", 65);
    assert_eq!(confidence, 65);
    assert!(note.is_none());
    let (confidence, note) = hallucination_check(dec("12.50"), "<p>$99</p>", 65);
    assert_eq!(confidence, 45);
    assert!(note.is_some());
}

#[test]
fn literal_forms_of_huge_prices_skip_cents() {
    let forms = price_literal_forms(Decimal::MAX);
    assert!(forms.contains(&Decimal::MAX.to_string()));
    assert!(!forms.is_empty());
}

#[test]
fn hallucination_check_handles_huge_prices() {
    let (confidence, note) = hallucination_check(Decimal::MAX, "<p>$80.00</p>", 90);
    assert_eq!(confidence, 70);
    assert!(note.is_some());
}
