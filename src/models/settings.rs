// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user app settings (one document per user, keyed by user ID).

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Declares a closed settings enum serialized with upper-case names
/// (`NextToName` <-> `"NEXTTONAME"`).
macro_rules! settings_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[cfg_attr(feature = "binding-generation", derive(TS))]
        #[cfg_attr(
            feature = "binding-generation",
            ts(export, export_to = "app/src/lib/generated/")
        )]
        #[serde(rename_all = "UPPERCASE")]
        pub enum $name {
            $($variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }
    };
}

settings_enum!(
    /// Color theme.
    Theme { Light, Dark } default Light
);
settings_enum!(
    /// UI language.
    Language { En, Bg } default En
);
settings_enum!(
    TextSize { Small, Medium, Large } default Medium
);
settings_enum!(
    /// Where role colors are shown next to a user.
    RoleColors { NextToName, InName, Hidden } default InName
);
settings_enum!(
    /// Who may send the user messages.
    MessagesAllowance { AllMsg, FriendsOnly, NoMsg } default AllMsg
);
settings_enum!(
    Motion { AlwaysPlayGif, DontPlayGifWhenPossibleShow, NeverPlayGif } default DontPlayGifWhenPossibleShow
);
settings_enum!(
    StickersAnimation { Always, OnInteraction, Never } default Always
);

/// Settings document stored in Firestore.
///
/// Field names are camelCase because the mobile client reads this
/// document shape directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Owning user ID (also used as document ID)
    pub user_id: String,
    pub theme: Theme,
    pub language: Language,
    pub text_size: TextSize,
    pub font_style: String,
    pub zoom_level: String,
    pub show_role_colors: RoleColors,
    pub messages_allowance: MessagesAllowance,
    pub motion: Motion,
    pub stickers_animation: StickersAnimation,
    pub enabled_location_tracking: bool,

    // ─── Privacy / Consent ───────────────────────────────────────
    pub allow_city_stat_data_usage: bool,
    pub allow_data_personalization_usage: bool,
    pub allow_in_app_rewards: bool,
    pub allow_data_analytics_and_performance: bool,

    // ─── Notifications ───────────────────────────────────────────
    pub enable_in_app_notifications: bool,
    pub enable_sound_effects: bool,
    pub enable_vibration: bool,
}

impl Settings {
    /// Default settings for a freshly provisioned user.
    ///
    /// Location tracking is off until the user grants permission.
    pub fn default_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            theme: Theme::default(),
            language: Language::default(),
            text_size: TextSize::default(),
            font_style: "default".to_string(),
            zoom_level: "100".to_string(),
            show_role_colors: RoleColors::default(),
            messages_allowance: MessagesAllowance::default(),
            motion: Motion::default(),
            stickers_animation: StickersAnimation::default(),
            enabled_location_tracking: false,
            allow_city_stat_data_usage: true,
            allow_data_personalization_usage: true,
            allow_in_app_rewards: true,
            allow_data_analytics_and_performance: true,
            enable_in_app_notifications: true,
            enable_sound_effects: true,
            enable_vibration: true,
        }
    }
}

/// Partial settings update.
///
/// Enum fields only accept their closed value sets; anything else fails
/// deserialization and is reported as a bad request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub language: Option<Language>,
    pub text_size: Option<TextSize>,
    pub font_style: Option<String>,
    pub zoom_level: Option<String>,
    pub show_role_colors: Option<RoleColors>,
    pub messages_allowance: Option<MessagesAllowance>,
    pub motion: Option<Motion>,
    pub stickers_animation: Option<StickersAnimation>,
    pub enabled_location_tracking: Option<bool>,
    pub allow_city_stat_data_usage: Option<bool>,
    pub allow_data_personalization_usage: Option<bool>,
    pub allow_in_app_rewards: Option<bool>,
    #[serde(alias = "allowDataAnaliticsAndPerformance")]
    pub allow_data_analytics_and_performance: Option<bool>,
    pub enable_in_app_notifications: Option<bool>,
    pub enable_sound_effects: Option<bool>,
    pub enable_vibration: Option<bool>,
}

fn set_if_some<T: Clone>(target: &mut T, value: &Option<T>, changed: &mut bool) {
    if let Some(v) = value {
        *target = v.clone();
        *changed = true;
    }
}

impl SettingsPatch {
    /// Apply present fields. Returns whether anything was set.
    pub fn apply(&self, settings: &mut Settings) -> bool {
        let mut changed = false;
        set_if_some(&mut settings.theme, &self.theme, &mut changed);
        set_if_some(&mut settings.language, &self.language, &mut changed);
        set_if_some(&mut settings.text_size, &self.text_size, &mut changed);
        set_if_some(&mut settings.font_style, &self.font_style, &mut changed);
        set_if_some(&mut settings.zoom_level, &self.zoom_level, &mut changed);
        set_if_some(
            &mut settings.show_role_colors,
            &self.show_role_colors,
            &mut changed,
        );
        set_if_some(
            &mut settings.messages_allowance,
            &self.messages_allowance,
            &mut changed,
        );
        set_if_some(&mut settings.motion, &self.motion, &mut changed);
        set_if_some(
            &mut settings.stickers_animation,
            &self.stickers_animation,
            &mut changed,
        );
        set_if_some(
            &mut settings.enabled_location_tracking,
            &self.enabled_location_tracking,
            &mut changed,
        );
        set_if_some(
            &mut settings.allow_city_stat_data_usage,
            &self.allow_city_stat_data_usage,
            &mut changed,
        );
        set_if_some(
            &mut settings.allow_data_personalization_usage,
            &self.allow_data_personalization_usage,
            &mut changed,
        );
        set_if_some(
            &mut settings.allow_in_app_rewards,
            &self.allow_in_app_rewards,
            &mut changed,
        );
        set_if_some(
            &mut settings.allow_data_analytics_and_performance,
            &self.allow_data_analytics_and_performance,
            &mut changed,
        );
        set_if_some(
            &mut settings.enable_in_app_notifications,
            &self.enable_in_app_notifications,
            &mut changed,
        );
        set_if_some(
            &mut settings.enable_sound_effects,
            &self.enable_sound_effects,
            &mut changed,
        );
        set_if_some(
            &mut settings.enable_vibration,
            &self.enable_vibration,
            &mut changed,
        );
        changed
    }
}
