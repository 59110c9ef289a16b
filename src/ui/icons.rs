//! Shared UI icons.

use console::Emoji;

pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "->");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">>");
