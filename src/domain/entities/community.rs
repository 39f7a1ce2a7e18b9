use crate::domain::entities::post::is_http_url;
use crate::domain::entities::user::UserSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub member_count: i64,
    #[serde(default)]
    pub members: Vec<UserSummary>,
}

/// Fields accepted by `PUT /community/{id}`; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommunityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Fields of the create community form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityDraft {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CommunityDraft {
    /// `tags` is the comma separated list typed into the form.
    pub fn new(name: impl Into<String>, description: impl Into<String>, tags: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim().chars().count();
        if name < 3 {
            return Err("Name must be at least 3 characters".to_string());
        }
        if name > 50 {
            return Err("Name must be less than 50 characters".to_string());
        }
        let description = self.description.trim().chars().count();
        if description < 10 {
            return Err("Description must be at least 10 characters".to_string());
        }
        if description > 500 {
            return Err("Description must be less than 500 characters".to_string());
        }
        match &self.image {
            Some(image) if !is_http_url(image) => Err("Must be a valid URL".to_string()),
            _ => Ok(()),
        }
    }
}

impl Community {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            tags: Vec::new(),
            image: None,
            is_member: false,
            member_count: 0,
            members: Vec::new(),
        }
    }

    /// Marks the viewer as a member and lists them among the members.
    pub fn join(&mut self, viewer: Option<&UserSummary>) {
        self.is_member = true;
        self.member_count += 1;
        if let Some(viewer) = viewer
            && !self.members.iter().any(|m| m.id == viewer.id)
        {
            self.members.push(viewer.clone());
        }
    }

    pub fn leave(&mut self, viewer: Option<&UserSummary>) {
        self.is_member = false;
        if self.member_count > 0 {
            self.member_count -= 1;
        }
        if let Some(viewer) = viewer {
            self.members.retain(|m| m.id != viewer.id);
        }
    }

    /// Membership change for directory listings, which carry no member list.
    pub fn set_membership_flag(&mut self, join: bool) {
        if join {
            self.join(None);
        } else {
            self.leave(None);
        }
    }

    pub fn apply_update(&mut self, update: &CommunityUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(description) = &update.description {
            self.description = Some(description.clone());
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        if let Some(image) = &update.image {
            self.image = Some(image.clone());
        }
    }
}
