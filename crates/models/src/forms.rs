//! Per-resource request schemas.
//!
//! Multipart bodies arrive as loose string maps. Each schema pulls out the
//! fields its resource needs, rejects malformed input, and hands back the
//! exact scalar fields forwarded upstream. Field lookups accept both the
//! camelCase names the backend uses and snake_case spellings.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::errors::ModelError;
use crate::user::validate_email;
use crate::{Achievement, Brand, Client, ContactMessage, Feature, Service, SubService, Work};

pub type FieldMap = HashMap<String, String>;

pub trait FormSchema: Sized + Clone + Default + Send + Sync + 'static {
    /// Entity the backend returns for this resource.
    type Entity: DeserializeOwned + Send;

    /// Upstream name of the file part, if the resource carries an image.
    const FILE_FIELD: Option<&'static str> = None;
    const IMAGE_REQUIRED_ON_CREATE: bool = false;

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError>;
    fn validate(&self) -> Result<(), ModelError>;
    fn to_fields(&self) -> Vec<(&'static str, String)>;

    /// Seed an edit form from an existing entity, returning the raw image
    /// reference (URL, path or base64) when there is one.
    fn seed(entity: &Self::Entity) -> (Self, Option<String>);

    /// Parse then validate in one go.
    fn parse(fields: &FieldMap) -> Result<Self, ModelError> {
        let form = Self::from_fields(fields)?;
        form.validate()?;
        Ok(form)
    }
}

fn lookup<'a>(fields: &'a FieldMap, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| fields.get(*k)).map(|v| v.trim())
}

fn required(fields: &FieldMap, name: &'static str, keys: &[&str]) -> Result<String, ModelError> {
    match lookup(fields, keys) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ModelError::MissingField(name)),
    }
}

fn optional(fields: &FieldMap, keys: &[&str]) -> Option<String> {
    lookup(fields, keys).filter(|v| !v.is_empty()).map(str::to_string)
}

fn not_blank(value: &str, name: &'static str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::MissingField(name));
    }
    Ok(())
}

fn max_len(value: &str, name: &str, max: usize) -> Result<(), ModelError> {
    if value.chars().count() > max {
        return Err(ModelError::invalid(format!("{name} longer than {max} characters")));
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrandForm {
    pub name: String,
}

impl FormSchema for BrandForm {
    type Entity = Brand;
    const FILE_FIELD: Option<&'static str> = Some("logo");

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self { name: required(fields, "name", &["name"])? })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.name, "name")?;
        max_len(&self.name, "name", 255)
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }

    fn seed(entity: &Brand) -> (Self, Option<String>) {
        (Self { name: entity.name.clone() }, entity.logo_url.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientForm {
    pub name: String,
}

impl FormSchema for ClientForm {
    type Entity = Client;
    const FILE_FIELD: Option<&'static str> = Some("image");

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self { name: required(fields, "name", &["name"])? })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.name, "name")?;
        max_len(&self.name, "name", 255)
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }

    fn seed(entity: &Client) -> (Self, Option<String>) {
        (Self { name: entity.name.clone() }, entity.image_url.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceForm {
    pub name: String,
    pub short_desc: String,
    pub long_desc: String,
}

impl FormSchema for ServiceForm {
    type Entity = Service;
    const FILE_FIELD: Option<&'static str> = Some("image");
    const IMAGE_REQUIRED_ON_CREATE: bool = true;

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self {
            name: required(fields, "name", &["name"])?,
            short_desc: required(fields, "shortDesc", &["shortDesc", "short_desc"])?,
            long_desc: optional(fields, &["longDesc", "long_desc"]).unwrap_or_default(),
        })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.name, "name")?;
        not_blank(&self.short_desc, "shortDesc")?;
        max_len(&self.name, "name", 255)?;
        max_len(&self.short_desc, "shortDesc", 500)
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("shortDesc", self.short_desc.clone()),
            ("longDesc", self.long_desc.clone()),
        ]
    }

    fn seed(entity: &Service) -> (Self, Option<String>) {
        let form = Self {
            name: entity.name.clone(),
            short_desc: entity.short_desc.clone(),
            long_desc: entity.long_desc.clone(),
        };
        let image = Some(entity.image_url.clone()).filter(|s| !s.trim().is_empty());
        (form, image)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureForm {
    pub feature_name: String,
    pub feature_desc: String,
}

impl FormSchema for FeatureForm {
    type Entity = Feature;

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self {
            feature_name: required(fields, "featureName", &["featureName", "feature_name"])?,
            feature_desc: optional(fields, &["featureDesc", "feature_desc"]).unwrap_or_default(),
        })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.feature_name, "featureName")?;
        max_len(&self.feature_name, "featureName", 255)
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("featureName", self.feature_name.clone()),
            ("featureDesc", self.feature_desc.clone()),
        ]
    }

    fn seed(entity: &Feature) -> (Self, Option<String>) {
        let form = Self {
            feature_name: entity.feature_name.clone(),
            feature_desc: entity.feature_desc.clone(),
        };
        (form, None)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubServiceForm {
    pub name: String,
    pub description: String,
}

impl FormSchema for SubServiceForm {
    type Entity = SubService;

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self {
            name: required(fields, "name", &["name"])?,
            description: optional(fields, &["description"]).unwrap_or_default(),
        })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.name, "name")?;
        max_len(&self.name, "name", 255)
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone()), ("description", self.description.clone())]
    }

    fn seed(entity: &SubService) -> (Self, Option<String>) {
        (Self { name: entity.name.clone(), description: entity.description.clone() }, None)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkForm {
    pub description: String,
}

impl FormSchema for WorkForm {
    type Entity = Work;

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self { description: required(fields, "description", &["description"])? })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.description, "description")
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![("description", self.description.clone())]
    }

    fn seed(entity: &Work) -> (Self, Option<String>) {
        (Self { description: entity.description.clone() }, None)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AchievementForm {
    pub title: String,
}

impl FormSchema for AchievementForm {
    type Entity = Achievement;
    const FILE_FIELD: Option<&'static str> = Some("image");
    const IMAGE_REQUIRED_ON_CREATE: bool = true;

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self { title: required(fields, "title", &["title"])? })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.title, "title")?;
        max_len(&self.title, "title", 255)
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![("title", self.title.clone())]
    }

    fn seed(entity: &Achievement) -> (Self, Option<String>) {
        let image = Some(entity.image_url.clone()).filter(|s| !s.trim().is_empty());
        (Self { title: entity.title.clone() }, image)
    }
}

/// Public contact form; the only schema forwarded without a bearer token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactForm {
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub interested_in: Option<String>,
    pub message: Option<String>,
}

impl FormSchema for ContactForm {
    type Entity = ContactMessage;

    fn from_fields(fields: &FieldMap) -> Result<Self, ModelError> {
        Ok(Self {
            full_name: required(fields, "fullName", &["fullName", "full_name"])?,
            email: required(fields, "email", &["email"])?,
            phone_number: optional(fields, &["phoneNumber", "phone_number"]),
            company_name: optional(fields, &["companyName", "company_name"]),
            interested_in: optional(fields, &["interestedIn", "interested_in"]),
            message: optional(fields, &["message"]),
        })
    }

    fn validate(&self) -> Result<(), ModelError> {
        not_blank(&self.full_name, "fullName")?;
        validate_email(&self.email)?;
        if let Some(phone) = &self.phone_number {
            let ok = phone
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
            if !ok {
                return Err(ModelError::invalid("phoneNumber contains invalid characters"));
            }
        }
        if let Some(msg) = &self.message {
            max_len(msg, "message", 5000)?;
        }
        Ok(())
    }

    fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![("fullName", self.full_name.clone()), ("email", self.email.clone())];
        let extras = [
            ("phoneNumber", &self.phone_number),
            ("companyName", &self.company_name),
            ("interestedIn", &self.interested_in),
            ("message", &self.message),
        ];
        for (name, value) in extras {
            if let Some(v) = value {
                out.push((name, v.clone()));
            }
        }
        out
    }

    fn seed(entity: &ContactMessage) -> (Self, Option<String>) {
        let form = Self {
            full_name: entity.full_name.clone(),
            email: entity.email.clone(),
            phone_number: entity.phone_number.clone(),
            company_name: entity.company_name.clone(),
            interested_in: entity.interested_in.clone(),
            message: entity.message.clone(),
        };
        (form, None)
    }
}
