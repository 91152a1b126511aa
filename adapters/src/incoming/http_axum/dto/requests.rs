use serde::Deserialize;
#[cfg(feature = "docs")]
use utoipa::ToSchema;
use validator::Validate;

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Recipe generation request; image_provider selects the optional image stage",
    example = json!({
        "ingredients": ["tomato", "basil", "mozzarella"],
        "prompt": "something quick for dinner",
        "image_provider": "dashscope"
    })
))]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 25, message = "between 1 and 25 ingredients required"))]
    pub ingredients: Vec<String>,

    #[validate(length(max = 500, message = "prompt must be at most 500 characters"))]
    pub prompt: Option<String>,

    /// Provider name ("dashscope" or "replicate"); omit for text only.
    pub image_provider: Option<String>,
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditAction {
    Spend,
    Earn,
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Manual credit mutation (admin tooling)",
    example = json!({ "action": "earn", "amount": 5 })
))]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreditMutationRequest {
    pub action: CreditAction,

    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskStatusQuery {
    #[validate(length(min = 1, message = "provider is required"))]
    pub provider: String,

    #[validate(length(min = 1, message = "task_id is required"))]
    pub task_id: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_ingredient_list_fails_validation() {
        let request = GenerateRequest {
            ingredients: Vec::new(),
            prompt: None,
            image_provider: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_amount_mutation_fails_validation() {
        let request = CreditMutationRequest {
            action: CreditAction::Spend,
            amount: 0,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn action_parses_from_lowercase() {
        let action: CreditAction = serde_json::from_str(r#""earn""#).unwrap();
        assert_eq!(action, CreditAction::Earn);
    }
}
