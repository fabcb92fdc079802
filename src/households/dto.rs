use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct MyHousehold {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdMemberItem {
    pub membership_id: Uuid,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdListItem {
    pub id: Uuid,
    pub name: String,
    pub member_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct HouseholdNameBody {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdCheck {
    pub has_household: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_item_field_names() {
        let item = HouseholdMemberItem {
            membership_id: Uuid::new_v4(),
            user_id: "user-1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            image: None,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"membershipId\""));
        assert!(json.contains("\"userId\""));
        assert!(json.contains("\"image\":null"));
    }

    #[test]
    fn test_list_item_field_names() {
        let item = HouseholdListItem {
            id: Uuid::new_v4(),
            name: "Home".into(),
            member_count: 3,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"memberCount\":3"));
    }

    #[test]
    fn test_check_field_name() {
        let json = serde_json::to_string(&HouseholdCheck { has_household: true }).unwrap();
        assert_eq!(json, "{\"hasHousehold\":true}");
    }
}
