use crate::api::error::AppError;
use crate::entities::user_documents;
use crate::models::{
    ProgressBucket, RequirementState, RequirementStatus, Scheme, SchemeProgress,
    UploadedDocument, VerificationStatus,
};
use crate::services::document_repository::DocumentRepository;
use crate::services::scheme_repository::SchemeRepository;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct SchemeService {
    schemes: Arc<dyn SchemeRepository>,
    documents: Arc<dyn DocumentRepository>,
}

/// True when either label contains the other, ignoring case
pub fn document_types_match(detected: &str, required: &str) -> bool {
    let detected = detected.trim().to_lowercase();
    let required = required.trim().to_lowercase();
    if detected.is_empty() || required.is_empty() {
        return false;
    }
    detected == required || detected.contains(&required) || required.contains(&detected)
}

impl SchemeService {
    pub fn new(schemes: Arc<dyn SchemeRepository>, documents: Arc<dyn DocumentRepository>) -> Self {
        Self { schemes, documents }
    }

    /// Case-insensitive text search over title, description and benefits,
    /// optionally restricted to one category ("all" means no restriction).
    pub async fn search(
        &self,
        search: Option<&str>,
        category: Option<&str>,
    ) -> Result<Vec<Scheme>, AppError> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));

        let schemes = self.schemes.list().await?;

        Ok(schemes
            .into_iter()
            .map(Scheme::from)
            .filter(|s| match &needle {
                Some(n) => {
                    s.title.to_lowercase().contains(n)
                        || s.description.to_lowercase().contains(n)
                        || s.benefits.to_lowercase().contains(n)
                }
                None => true,
            })
            .filter(|s| match category {
                Some(c) => s.category.eq_ignore_ascii_case(c),
                None => true,
            })
            .collect())
    }

    pub async fn categories(&self) -> Result<Vec<String>, AppError> {
        let schemes = self.schemes.list().await?;
        let set: BTreeSet<String> = schemes.into_iter().map(|s| s.category).collect();
        Ok(set.into_iter().collect())
    }

    pub async fn get(&self, id: i32) -> Result<Scheme, AppError> {
        self.schemes
            .find_by_id(id)
            .await?
            .map(Scheme::from)
            .ok_or_else(|| AppError::NotFound(format!("Scheme {} not found", id)))
    }

    /// Per-requirement readiness of a user's documents for one scheme
    pub async fn progress(&self, user_id: &str, scheme_id: i32) -> Result<SchemeProgress, AppError> {
        let scheme = self.get(scheme_id).await?;
        let docs = self.documents.find_for_user(user_id, Some(scheme_id)).await?;

        Ok(compute_progress(&scheme, docs))
    }
}

fn compute_progress(scheme: &Scheme, docs: Vec<user_documents::Model>) -> SchemeProgress {
    let docs: Vec<UploadedDocument> = docs.into_iter().map(UploadedDocument::from).collect();

    let requirements: Vec<RequirementStatus> = scheme
        .required_documents
        .iter()
        .map(|required| {
            let doc = docs
                .iter()
                .filter(|d| d.document_type.trim().eq_ignore_ascii_case(required.trim()))
                .max_by_key(|d| d.updated_at);

            match doc {
                None => RequirementStatus {
                    document_type: required.clone(),
                    state: RequirementState::Missing,
                    document_id: None,
                    detected_type_matches: None,
                },
                Some(d) => RequirementStatus {
                    document_type: required.clone(),
                    state: match d.verification_status {
                        VerificationStatus::Pending => RequirementState::Pending,
                        VerificationStatus::Verified => RequirementState::Verified,
                        VerificationStatus::Failed => RequirementState::Failed,
                    },
                    document_id: Some(d.id.clone()),
                    detected_type_matches: d
                        .verification_result
                        .as_ref()
                        .map(|r| document_types_match(&r.document_type, required)),
                },
            }
        })
        .collect();

    let total_required = requirements.len();
    let verified_count = requirements
        .iter()
        .filter(|r| r.state == RequirementState::Verified)
        .count();

    let percentage = if total_required == 0 {
        100
    } else {
        ((verified_count as f64 / total_required as f64) * 100.0).round() as u32
    };
    let status = ProgressBucket::from_percentage(percentage);

    SchemeProgress {
        scheme_id: scheme.id,
        total_required,
        verified_count,
        percentage,
        status,
        message: status.message().to_string(),
        requirements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn scheme(docs: &[&str]) -> Scheme {
        Scheme {
            id: 1,
            title: "Test Scheme".into(),
            category: "Education".into(),
            eligibility: "Girls".into(),
            required_documents: docs.iter().map(|d| d.to_string()).collect(),
            description: String::new(),
            benefits: String::new(),
            application_link: None,
        }
    }

    fn doc(document_type: &str, status: &str, detected: Option<&str>) -> user_documents::Model {
        let now = Utc::now();
        user_documents::Model {
            id: format!("doc-{}", document_type),
            user_id: "u1".into(),
            scheme_id: 1,
            document_type: document_type.into(),
            file_name: "f.jpg".into(),
            storage_key: "u1/f.jpg".into(),
            file_url: "http://x/u1/f.jpg".into(),
            file_size: 10,
            mime_type: "image/jpeg".into(),
            checksum: String::new(),
            verification_status: status.into(),
            verification_result: detected.map(|t| {
                json!({
                    "fileName": "f.jpg",
                    "documentType": t,
                    "isValid": status == "verified",
                    "confidence": 0.8,
                    "issues": [],
                    "keyFindings": [],
                    "recommendations": []
                })
            }),
            created_at: now - Duration::minutes(5),
            updated_at: now,
        }
    }

    #[test]
    fn test_document_types_match() {
        assert!(document_types_match("Aadhaar Card", "aadhaar card"));
        assert!(document_types_match("Aadhaar", "Aadhaar Card"));
        assert!(document_types_match("Government issued Aadhaar Card", "Aadhaar Card"));
        assert!(!document_types_match("PAN Card", "Aadhaar Card"));
        assert!(!document_types_match("", "Aadhaar Card"));
    }

    #[test]
    fn test_progress_states_and_bucket() {
        let progress = compute_progress(
            &scheme(&["Aadhaar Card", "Income Certificate", "Bank Passbook", "Photo"]),
            vec![
                doc("Aadhaar Card", "verified", Some("Aadhaar Card")),
                doc("Income Certificate", "verified", Some("Ration Card")),
                doc("Bank Passbook", "failed", Some("Bank Passbook")),
            ],
        );

        assert_eq!(progress.total_required, 4);
        assert_eq!(progress.verified_count, 2);
        assert_eq!(progress.percentage, 50);
        assert_eq!(progress.status, ProgressBucket::Partial);

        let states: Vec<_> = progress.requirements.iter().map(|r| r.state).collect();
        assert_eq!(
            states,
            vec![
                RequirementState::Verified,
                RequirementState::Verified,
                RequirementState::Failed,
                RequirementState::Missing
            ]
        );
        // A mismatched detected type does not downgrade a verified document
        assert_eq!(progress.requirements[1].detected_type_matches, Some(false));
    }

    #[test]
    fn test_progress_rounds_and_handles_pending() {
        let progress = compute_progress(
            &scheme(&["A", "B", "C"]),
            vec![doc("A", "verified", Some("A")), doc("B", "verified", Some("B")), doc("C", "pending", None)],
        );
        assert_eq!(progress.percentage, 67);
        assert_eq!(progress.status, ProgressBucket::Partial);
        assert_eq!(progress.requirements[2].state, RequirementState::Pending);
        assert_eq!(progress.requirements[2].detected_type_matches, None);
    }

    #[test]
    fn test_progress_without_requirements_is_complete() {
        let progress = compute_progress(&scheme(&[]), vec![]);
        assert_eq!(progress.percentage, 100);
        assert_eq!(progress.status, ProgressBucket::Complete);
        assert_eq!(
            progress.message,
            "You have all required documents verified! You're ready to apply."
        );
    }
}
