//! User exporter

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::serialize::{escape_ruby_string, escape_single_quoted};
use crate::source::{Collection, RecordSource, SourceDocument};

use super::driver::{Exporter, OutputLayout};
use super::error::{ExportError, ExportResult};
use super::templates::{USERS_BEGIN_ARRAY, USERS_CREATE_METHOD, USERS_FOOTER, USERS_HEADER};

/// User attributes written only when present
const NULLABLE_USER_FIELDS: [&str; 7] = [
    "code",
    "phone",
    "agency_office",
    "position",
    "location",
    "user_group_ids",
    "locale",
];

/// Options for the users script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserExportOptions {
    /// Send password reset and welcome emails when users are created
    pub send_reset_email: bool,
    /// User created first and used as the sender of welcome emails
    pub admin_user_name: Option<String>,
}

impl UserExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_send_reset_email(mut self, send_reset_email: bool) -> Self {
        self.send_reset_email = send_reset_email;
        self
    }

    pub fn with_admin_user_name(mut self, admin_user_name: Option<String>) -> Self {
        self.admin_user_name = admin_user_name.filter(|name| !name.is_empty());
        self
    }
}

/// Writes `users/users.rb`
pub struct UserExporter {
    options: UserExportOptions,
    admin_block: String,
}

impl UserExporter {
    /// Create the exporter, looking up the admin user in the source
    pub fn new(options: UserExportOptions, source: &dyn RecordSource) -> ExportResult<Self> {
        let admin_block = match &options.admin_user_name {
            None => "puts 'send_welcome_email will be skipped because the admin_user_name is not defined.'\n\n".to_string(),
            Some(name) => match find_user(source, name)? {
                Some(admin) => admin_user_block(name, &admin)?,
                None => {
                    warn!(admin_user_name = %name, "Admin user was not found");
                    format!(
                        "puts 'send_welcome_email will be skipped because the admin user: {} was not found.'\n",
                        escape_single_quoted(name)
                    )
                }
            },
        };
        Ok(Self {
            options,
            admin_block,
        })
    }

    fn initializers(&self) -> String {
        [
            "@agencies = Agency.all.reduce({}){ |acc, elem| acc.merge({ elem.unique_id => elem }) }".to_string(),
            "@user_groups = UserGroup.all.reduce({}){ |acc, elem| acc.merge({ elem.unique_id => elem }) }".to_string(),
            "@roles = Role.all.reduce({}){ |acc, elem| acc.merge({ elem.unique_id => elem }) }".to_string(),
            format!("@send_reset_email = {}\n", self.options.send_reset_email),
            "puts 'send_reset_password_instructions will be skipped because send_reset_email is not enabled.' if !@send_reset_email \n\n".to_string(),
        ]
        .join("\n")
    }
}

impl Exporter for UserExporter {
    fn label(&self) -> &str {
        "users"
    }

    fn collection(&self) -> Collection {
        Collection::User
    }

    fn layout(&self) -> OutputLayout {
        OutputLayout::Single
    }

    fn unit_path(&self, _index: usize) -> PathBuf {
        PathBuf::from("users/users.rb")
    }

    fn header(&self) -> String {
        format!(
            "{USERS_HEADER}{USERS_CREATE_METHOD}{}{}{USERS_BEGIN_ARRAY}",
            self.initializers(),
            self.admin_block
        )
    }

    fn footer(&self) -> String {
        USERS_FOOTER.to_string()
    }

    fn render(
        &mut self,
        document: &SourceDocument,
        _source: &dyn RecordSource,
    ) -> ExportResult<Vec<String>> {
        if document.str_field("user_name").is_some()
            && document.str_field("user_name") == self.options.admin_user_name.as_deref()
        {
            return Ok(Vec::new());
        }
        Ok(vec![user_hash(document)?])
    }
}

fn find_user(source: &dyn RecordSource, user_name: &str) -> ExportResult<Option<SourceDocument>> {
    for document in source.enumerate(Collection::User)? {
        let document = document?;
        if document.str_field("user_name") == Some(user_name) {
            return Ok(Some(document));
        }
    }
    Ok(None)
}

fn admin_user_block(name: &str, admin: &SourceDocument) -> ExportResult<String> {
    let hash = user_hash(admin)?;
    let hash = hash.trim_end_matches('\n').trim_end_matches(',');
    let name = escape_single_quoted(name);
    Ok([
        format!("puts 'Creating admin user: {name}...'"),
        format!("@admin_user = create_or_update_user(\n{hash}\n)"),
        "if @admin_user&.persisted?".to_string(),
        "  @admin_user.reload".to_string(),
        "else".to_string(),
        format!(
            "  puts 'send_welcome_email will be skipped because the admin user: {name} was not created.'"
        ),
        "end\n\n".to_string(),
    ]
    .join("\n"))
}

/// Ruby array literal of strings
fn string_array(values: &[Value]) -> ExportResult<String> {
    let items = values
        .iter()
        .filter_map(Value::as_str)
        .map(escape_ruby_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("[{}]", items.join(", ")))
}

/// Render a user as the hash passed to `create_or_update_user`
pub fn user_hash(user: &SourceDocument) -> ExportResult<String> {
    let user_name = user
        .str_field("user_name")
        .ok_or_else(|| ExportError::invalid_document("user", "missing user_name"))?;
    let role_id = user
        .array_field("role_ids")
        .iter()
        .find_map(Value::as_str)
        .ok_or_else(|| {
            ExportError::invalid_document("user", format!("user {user_name} has no role"))
        })?;
    let email = user
        .str_field("email")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{user_name}@test.com"));

    let mut lines = vec![
        "  {".to_string(),
        format!("    user_name: {},", escape_ruby_string(user_name)?),
        format!(
            "    full_name: {},",
            escape_ruby_string(user.str_field("full_name").unwrap_or(""))?
        ),
        format!("    email: {},", escape_ruby_string(&email)?),
        format!(
            "    disabled: {},",
            user.bool_field("disabled").unwrap_or(false)
        ),
        format!(
            "    agency_id: @agencies[{}]&.id,",
            escape_ruby_string(user.str_field("organization").unwrap_or(""))?
        ),
        format!("    role_id: @roles[{}]&.id,", escape_ruby_string(role_id)?),
        format!(
            "    time_zone: {},",
            escape_ruby_string(user.str_field("time_zone").unwrap_or("UTC"))?
        ),
        format!(
            "    send_mail: {},",
            user.bool_field("send_mail").unwrap_or(true)
        ),
        format!("    services: {},", string_array(user.array_field("services"))?),
    ];

    for field in NULLABLE_USER_FIELDS {
        match user.get(field) {
            Some(Value::Array(items)) if field == "user_group_ids" && !items.is_empty() => {
                lines.push(format!(
                    "    user_groups: {}.map {{ |unique_id| @user_groups[unique_id] }}.compact,",
                    string_array(items)?
                ));
            }
            Some(Value::String(s)) if !s.is_empty() => {
                lines.push(format!("    {field}: {},", escape_ruby_string(s)?));
            }
            Some(Value::Number(n)) => {
                lines.push(format!("    {field}: \"{n}\","));
            }
            _ => {}
        }
    }
    lines.push("  },\n".to_string());
    Ok(lines.join("\n"))
}
