//! Fixed script texts wrapped around generated literals
//!
//! Footers persist each constructed object with per-object error handling,
//! so one invalid entry does not stop the rest of a file from loading.

pub const RECORDS_HEADER: &str =
    "# Automatically generated script to migrate record data from v1.7 to v2.0+\n\nrecords = [\n";

pub const RECORDS_FOOTER: &str = concat!(
    "]\n\n",
    "records.each do |record|\n",
    "  puts \"Creating record #{record.id}\"\n",
    "  record.save!\n",
    "rescue ActiveRecord::RecordNotUnique\n",
    "  puts \"Skipping. Record #{record.id} already exists!\"\n",
    "rescue StandardError => e\n",
    "  puts \"Cannot create #{record.id}. Error #{e.message}\"\n",
    "end\n",
);

pub const FLAGS_HEADER: &str =
    "# Automatically generated script to migrate flags from v1.7 to v2.0+\n\nflags = [\n";

pub const FLAGS_FOOTER: &str = concat!(
    "]\n\n",
    "flags.each do |flag|\n",
    "  puts \"Creating flag...\"\n",
    "  if !flag.valid? && flag.errors.size == 1 && flag.errors.messages[:date].present?\n",
    "    puts \"Flag for #{flag.record_type} with id #{flag.record_id} does not have a valid date. Skipping validations to save it.\"\n",
    "    flag.save(validate: false)\n",
    "  else\n",
    "    flag.save!\n",
    "  end\n",
    "rescue ActiveRecord::RecordNotUnique\n",
    "  puts \"Skipping creation of flag for #{flag.record_type} with id #{flag.record_id}. It already exists.\"\n",
    "rescue StandardError => e\n",
    "  puts \"Cannot create flag for #{flag.record_type} with id #{flag.record_id} Error #{e.message}\"\n",
    "end\n",
);

pub const ALERTS_HEADER: &str =
    "# Automatically generated script to migrate alerts from v1.7 to v2.0+\n\nalerts = [\n";

pub const ALERTS_FOOTER: &str = concat!(
    "]\n\n",
    "alerts.each do |alert|\n",
    "  puts \"Creating record alert...\"\n",
    "  alert.save!\n",
    "rescue ActiveRecord::RecordNotUnique\n",
    "  puts \"Skipping creation of alert with id #{alert.unique_id}. It already exists.\"\n",
    "rescue StandardError => e\n",
    "  puts \"Cannot create alert for alert with id #{alert.unique_id}. Error #{e.message}\"\n",
    "end\n",
);

pub const HISTORIES_HEADER: &str = "# Automatically generated script to migrate record histories from v1.7 to v2.0+\n\nhistories = [\n";

pub const HISTORIES_FOOTER: &str = concat!(
    "]\n\n",
    "histories.each do |history|\n",
    "  puts \"Creating record history...\"\n",
    "  history.save!\n",
    "rescue ActiveRecord::RecordNotUnique\n",
    "  puts \"Skipping creation of history for #{history.record_type} with id #{history.record_id}. It already exists.\"\n",
    "rescue StandardError => e\n",
    "  puts \"Cannot create history for #{history.record_type} with id #{history.record_id} Error #{e.message}\"\n",
    "end\n",
);

/// Footer that saves each transition in `records`, skipping model validations
pub fn transitions_footer(plural: &str) -> String {
    [
        "]\n".to_string(),
        format!("puts \"Creating #{{records.count}} {plural}\""),
        "records.each do |record|".to_string(),
        "  record.save!(validate: false)".to_string(),
        "rescue ActiveRecord::RecordNotUnique".to_string(),
        "  puts \"Skipping. Transition #{record.id} already exists!\"".to_string(),
        "rescue StandardError => e".to_string(),
        "  puts \"Cannot create transition #{record.id}. Error #{e.message}\"".to_string(),
        "end\n".to_string(),
    ]
    .join("\n")
}

pub const ATTACHMENTS_HEADER: &str =
    "# Automatically generated script to migrate attachment from v1.7 to v2.0+\n\n";

pub const USERS_HEADER: &str = "# Automatically generated script to migrate users from v1.7 to v2.0+\n";

pub const USERS_CREATE_METHOD: &str = concat!(
    "def create_or_update_user(user_hash)\n",
    "  user = User.find_by(user_name: user_hash[:user_name])\n",
    "  if user.present?\n",
    "    user.assign_attributes(user_hash)\n",
    "  else\n",
    "    user = User.new(user_hash)\n",
    "  end\n",
    "  random_password = \"#{SecureRandom.base64(40)}1a\"\n",
    "  user.password = random_password\n",
    "  user.password_confirmation = random_password\n",
    "  puts \"Saving user: #{user.user_name}...\"\n",
    "  user.save!\n\n",
    "  if @send_reset_email\n",
    "    user.send_reset_password_instructions\n",
    "    user.send_welcome_email(@admin_user) if @admin_user.present?\n",
    "  end\n",
    "  user\n",
    "rescue ActiveRecord::RecordNotUnique\n",
    "  puts \"Skipping creation of user #{user.user_name}. User already exists.\"\n",
    "rescue StandardError => e\n",
    "  puts \"Error creating user: #{user.user_name}\"\n",
    "  puts e\n",
    "end\n\n",
);

pub const USERS_BEGIN_ARRAY: &str = "@users = [\n";

pub const USERS_FOOTER: &str = "]\n\n@users.each{ |user| create_or_update_user(user) }\n";

pub const SAVED_SEARCHES_HEADER: &str = concat!(
    "# Automatically generated script to migrate saved searches from v1.7 to v2.0+\n\n",
    "puts 'Deleting all saved searches...'\n",
    "SavedSearch.destroy_all\n\n",
    "saved_searches = [\n",
);

pub const SAVED_SEARCHES_FOOTER: &str = concat!(
    "]\n\n",
    "saved_searches.each do |saved_search|\n",
    "  begin\n",
    "    saved_search.save!\n",
    "    puts \"SavedSearch created successfuly for user: #{saved_search.user.user_name}\"\n",
    "  rescue StandardError => e\n",
    "    puts 'Error creating saved search'\n",
    "    puts e\n",
    "  end\n",
    "end\n",
);

pub const LOCATIONS_HEADER: &str = concat!(
    "# Automatically generated script to migrate locations from v1.7 to v2.0+\n\n",
    "Location.destroy_all\n\n",
    "locations = [\n",
);

pub const LOCATIONS_FOOTER: &str = concat!(
    "]\n\n",
    "Location.locations_by_code = locations.map { |l| [l.location_code, l] }.to_h\n\n",
    "locations.each do |loc|\n",
    "  loc.set_name_from_hierarchy_placenames\n",
    "end\n\n",
    "locations.each do |loc|\n",
    "  puts \"Creating location #{loc.location_code}\"\n",
    "  loc.save!\n",
    "rescue ActiveRecord::RecordNotUnique\n",
    "  puts \"Skipping. Location #{loc.location_code} already exists!\"\n",
    "rescue StandardError => e\n",
    "  puts \"Cannot create #{loc.location_code}. Error #{e.message}\"\n",
    "end\n",
);

pub const SYSTEM_SETTINGS_CREATE_METHOD: &str = concat!(
    "def create_or_update_system_setting(setting_hash)\n",
    "  # There should only be 1 row in system settings\n",
    "  system_setting = SystemSettings.first\n",
    "  if system_setting.nil?\n",
    "    puts 'Creating System Settings '\n",
    "    SystemSettings.create!(setting_hash)\n",
    "  else\n",
    "    puts 'Updating System Settings'\n",
    "    system_setting.update_attributes setting_hash\n",
    "  end\n",
    "end\n",
);
