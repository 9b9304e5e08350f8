//! Built-in product/expert directories and stage guides
//!
//! Read-only catalog data served to the recommendation and directory
//! endpoints. There is no admin surface for editing these; they ship
//! with the binary.

use serde::Serialize;

use super::models::DiagnosisStage;

/// A hair-care product listing
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    /// Category: shampoo, tonic, supplement, other
    pub category: &'static str,
    pub description: &'static str,
    pub price_range: &'static str,
    pub rating: f64,
    pub review_count: u32,
}

/// A consultable expert listing
#[derive(Debug, Clone, Serialize)]
pub struct Expert {
    pub id: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub hospital: &'static str,
    pub specialty: &'static str,
    pub rating: f64,
    pub consult_fee: &'static str,
}

/// Per-stage management guide shown with a diagnosis result
#[derive(Debug, Clone, Serialize)]
pub struct ManagementGuide {
    pub stage: DiagnosisStage,
    pub title: &'static str,
    pub items: &'static [&'static str],
}

const PRODUCTS: &[Product] = &[
    Product {
        id: "p1",
        name: "Scalp Care Shampoo A",
        category: "shampoo",
        description: "Formulated to improve scalp circulation and strengthen follicles.",
        price_range: "under $20",
        rating: 4.5,
        review_count: 320,
    },
    Product {
        id: "p2",
        name: "Hair Loss Prevention Tonic B",
        category: "tonic",
        description: "Capillary-dilating ingredients to improve scalp blood flow.",
        price_range: "$25-35",
        rating: 4.2,
        review_count: 180,
    },
    Product {
        id: "p3",
        name: "Biotin Supplement C",
        category: "supplement",
        description: "Biotin supplement supporting hair and nail health.",
        price_range: "around $12",
        rating: 4.7,
        review_count: 520,
    },
    Product {
        id: "p4",
        name: "Scalp Massager D",
        category: "other",
        description: "At-home scalp massage to stimulate circulation.",
        price_range: "around $40",
        rating: 4.3,
        review_count: 95,
    },
];

const EXPERTS: &[Expert] = &[
    Expert {
        id: "e1",
        name: "Dr. Kim",
        title: "Hair loss and transplant specialist",
        hospital: "Seoul Hair Clinic",
        specialty: "Androgenetic alopecia, scalp diagnostics",
        rating: 4.8,
        consult_fee: "consultation from $25",
    },
    Expert {
        id: "e2",
        name: "Dr. Lee",
        title: "Board-certified dermatologist",
        hospital: "Delta Dermatology",
        specialty: "Scalp disorders, hair loss treatment",
        rating: 4.6,
        consult_fee: "standard clinic rates",
    },
];

const NORMAL_GUIDE_ITEMS: &[&str] = &[
    "Regular scalp massage to stimulate circulation",
    "Balanced diet (protein, vitamins, minerals)",
    "Manage stress and get enough sleep",
    "Use a suitable shampoo and keep the scalp clean",
];

const CAUTION_GUIDE_ITEMS: &[&str] = &[
    "Consider dedicated scalp-care products (shampoo, tonic)",
    "Scalp massage routine (3-4 times a week)",
    "Review preventive supplements (biotin, zinc)",
    "Re-photograph in 3-6 months to track changes",
    "Book an expert consultation if symptoms progress",
];

const RISK_GUIDE_ITEMS: &[&str] = &[
    "See a hair-loss specialist as soon as possible",
    "Review medical-device and prescription options",
    "Combine professional care with scalp-care routines",
    "Keep periodic photo records for follow-up",
    "Disclaimer: this result is not a medical diagnosis; consult a clinic for an accurate assessment",
];

/// All products, optionally filtered by category
pub fn products(category: Option<&str>) -> Vec<Product> {
    PRODUCTS
        .iter()
        .filter(|product| category.is_none_or(|c| product.category == c))
        .cloned()
        .collect()
}

/// All experts
pub fn experts() -> Vec<Expert> {
    EXPERTS.to_vec()
}

/// Management guide for a diagnosis stage
pub fn guide_for_stage(stage: DiagnosisStage) -> ManagementGuide {
    match stage {
        DiagnosisStage::Normal => ManagementGuide {
            stage,
            title: "Healthy scalp maintenance guide",
            items: NORMAL_GUIDE_ITEMS,
        },
        DiagnosisStage::Caution => ManagementGuide {
            stage,
            title: "Caution-stage care guide",
            items: CAUTION_GUIDE_ITEMS,
        },
        DiagnosisStage::Risk => ManagementGuide {
            stage,
            title: "Risk-stage care guide",
            items: RISK_GUIDE_ITEMS,
        },
    }
}

/// Product recommendations for a diagnosis stage
///
/// Normal keeps it to maintenance basics; caution adds tonics and
/// supplements; risk surfaces the full catalog alongside the
/// see-a-specialist guidance.
pub fn recommendations_for_stage(stage: DiagnosisStage) -> Vec<Product> {
    let categories: &[&str] = match stage {
        DiagnosisStage::Normal => &["shampoo"],
        DiagnosisStage::Caution => &["shampoo", "tonic", "supplement"],
        DiagnosisStage::Risk => &["shampoo", "tonic", "supplement", "other"],
    };

    PRODUCTS
        .iter()
        .filter(|product| categories.contains(&product.category))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_filter_by_category() {
        assert_eq!(products(None).len(), 4);
        let shampoos = products(Some("shampoo"));
        assert_eq!(shampoos.len(), 1);
        assert_eq!(shampoos[0].id, "p1");
        assert!(products(Some("unknown")).is_empty());
    }

    #[test]
    fn every_stage_has_a_guide() {
        for stage in [
            DiagnosisStage::Normal,
            DiagnosisStage::Caution,
            DiagnosisStage::Risk,
        ] {
            let guide = guide_for_stage(stage);
            assert_eq!(guide.stage, stage);
            assert!(!guide.items.is_empty());
        }
    }

    #[test]
    fn recommendations_broaden_with_stage() {
        let normal = recommendations_for_stage(DiagnosisStage::Normal);
        let caution = recommendations_for_stage(DiagnosisStage::Caution);
        let risk = recommendations_for_stage(DiagnosisStage::Risk);
        assert!(normal.len() < caution.len());
        assert!(caution.len() < risk.len());
        assert_eq!(risk.len(), 4);
    }
}
