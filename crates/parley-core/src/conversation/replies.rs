//! Text of every message the bot sends on its own initiative.
//!
//! Greetings are personalized with the user's salutation and name and follow
//! the local time of day at the configured UTC offset.

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};

use parley_types::config::{ConversationConfig, RateLimitConfig};
use parley_types::feedback::{MAX_COMMENT_CHARS, Rating};
use parley_types::user::UserProfile;

/// Coarse local time of day used to pick a greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Morning,
    Midday,
    Afternoon,
    Evening,
}

impl DayPart {
    /// 04-11 morning, 11-15 midday, 15-18 afternoon, otherwise evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            4..=10 => DayPart::Morning,
            11..=14 => DayPart::Midday,
            15..=17 => DayPart::Afternoon,
            _ => DayPart::Evening,
        }
    }

    pub fn greeting(self) -> &'static str {
        match self {
            DayPart::Morning => "Good morning",
            DayPart::Midday => "Good day",
            DayPart::Afternoon => "Good afternoon",
            DayPart::Evening => "Good evening",
        }
    }
}

/// Message catalogue bound to the bot's configuration.
#[derive(Debug, Clone)]
pub struct Replies {
    offset: FixedOffset,
    help_command: String,
    end_command: String,
    skip_command: String,
    expiry_minutes: u64,
    auto_rating: Rating,
    max_messages: usize,
    window_minutes: u64,
}

fn first_or(commands: &[String], fallback: &str) -> String {
    commands
        .first()
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

impl Replies {
    pub fn new(conversation: &ConversationConfig, rate_limit: &RateLimitConfig) -> Self {
        let offset = FixedOffset::east_opt(conversation.utc_offset_hours.clamp(-23, 23) * 3600)
            .unwrap_or_else(|| Utc.fix());
        Self {
            offset,
            help_command: first_or(&conversation.help_commands, "/help"),
            // The last configured end command is the one advertised to users.
            end_command: conversation
                .end_commands
                .last()
                .cloned()
                .unwrap_or_else(|| "/end".to_string()),
            skip_command: first_or(&conversation.skip_commands, "/skip"),
            expiry_minutes: conversation.expiry_timeout_secs.div_ceil(60),
            auto_rating: conversation.auto_rating(),
            max_messages: rate_limit.max_messages,
            window_minutes: rate_limit.window_secs.div_ceil(60),
        }
    }

    pub fn day_part(&self, now: DateTime<Utc>) -> DayPart {
        DayPart::from_hour(now.with_timezone(&self.offset).hour())
    }

    /// "Good morning, Mr. John (Manager)!"
    pub fn personalized_greeting(&self, user: &UserProfile, now: DateTime<Utc>) -> String {
        let mut name = user.name.trim().to_string();
        if let Some(job) = user.job_title.as_deref().map(str::trim).filter(|j| !j.is_empty()) {
            name = format!("{name} ({job})");
        }
        format!(
            "{}, {} {}!",
            self.day_part(now).greeting(),
            user.salutation(),
            name
        )
    }

    pub fn welcome(&self, user: &UserProfile, now: DateTime<Utc>) -> String {
        format!(
            "{} 👋\n\nWelcome! I am a virtual assistant ready to help with questions about our services.\n\nHow can I help you today?",
            self.personalized_greeting(user, now)
        )
    }

    pub fn help(&self) -> String {
        format!(
            "📖 *How to use this bot*\n\nSend your question at any time and I will answer it.\n\n*Commands:*\n• {} - show this guide\n• {} - end the session and give feedback",
            self.help_command, self.end_command
        )
    }

    pub fn rating_request(&self) -> String {
        "*[Step 1/2]* ⭐\n\nThank you for using our service! 🙏\n\nPlease rate your experience (1-5):\n\n1 = Very unsatisfied\n2 = Unsatisfied\n3 = Fairly satisfied\n4 = Satisfied\n5 = Very satisfied".to_string()
    }

    pub fn invalid_rating(&self) -> String {
        "Sorry, the rating must be a number from 1 to 5 😊\n\n*Example:* type *3* for a 3-star rating\n\nPlease try again:".to_string()
    }

    pub fn rating_confirmation(&self, rating: Rating) -> String {
        let (emoji, thanks) = match rating.value() {
            5 => ("🌟", "Thank you for the perfect rating!"),
            4 => ("⭐", "Thank you for the good rating!"),
            3 => ("👍", "Thank you for your rating."),
            2 => ("🙏", "Thank you for your feedback."),
            _ => ("🙏", "Thank you for sharing your experience."),
        };
        format!(
            "{emoji} {thanks}\nRating: {rating}/5\n\n*[Step 2/2]* 📝\n\nHelp us improve by leaving a comment or suggestion.\n\n💡 Type '{}' to skip.",
            self.skip_command
        )
    }

    pub fn comment_too_long(&self) -> String {
        format!(
            "Sorry, your comment is too long. Please keep it under {MAX_COMMENT_CHARS} characters, or type '{}' to skip.",
            self.skip_command
        )
    }

    pub fn goodbye(&self, rating: Rating, has_comment: bool, now: DateTime<Utc>) -> String {
        let mut message = match rating.value() {
            4..=5 => "Glad to hear you had a good experience! 😊\n\n".to_string(),
            3 => "Thank you for your feedback. We will keep improving! 💪\n\n".to_string(),
            _ => "We apologize for the inconvenience. We will work on improving our service. 🙏\n\n"
                .to_string(),
        };
        if has_comment {
            message.push_str(
                "Your comments are valuable to us and will help us improve the quality of our service.\n\n",
            );
        }
        message.push_str(&format!(
            "See you again! 👋\n\n{} and have a pleasant day! ✨",
            self.day_part(now).greeting()
        ));
        message
    }

    pub fn save_failed(&self) -> String {
        "Sorry, something went wrong while saving your feedback. Please try again later.".to_string()
    }

    pub fn ai_failed(&self) -> String {
        "Sorry, I cannot process your message right now. Please try again later.".to_string()
    }

    pub fn too_fast(&self) -> String {
        "Please wait a moment before sending your next message 🙏".to_string()
    }

    pub fn window_full(&self) -> String {
        format!(
            "You have reached the message limit ({} messages per {} minutes). Please wait a little while 🙏",
            self.max_messages, self.window_minutes
        )
    }

    /// Sent after a period of inactivity, or on operator request.
    ///
    /// Only automatic prompts promise a default rating; an unanswered operator
    /// prompt closes the session without recording one.
    pub fn feedback_prompt(&self, user: &UserProfile, now: DateTime<Utc>, automatic: bool) -> String {
        let mut message = format!(
            "{}, {} {}, to help us improve our service, we would appreciate your rating 🙏🏻\n\nIf you are willing, please rate the quality of our service from 1 to 5, considering:\n1. Speed in responding to questions or complaints\n2. Quality of communication and information provided\n3. Accuracy and usefulness of the solution\n\nTo give feedback, type {}",
            self.day_part(now).greeting(),
            user.salutation(),
            user.name.trim(),
            self.end_command,
        );
        if automatic {
            message.push_str(&format!(
                "\n\n⏱️ *Note:* if there is no response within {} minutes, we will record a {}-star rating on your behalf.",
                self.expiry_minutes, self.auto_rating
            ));
        }
        message
    }

    pub fn auto_submitted(&self) -> String {
        format!(
            "Thank you! ✨\n\nSince we did not hear back, we recorded your feedback with a {}-star rating ⭐\n\nWe appreciate your time and hope our service met your needs. See you again! 👋",
            self.auto_rating
        )
    }
}

impl Default for Replies {
    fn default() -> Self {
        Self::new(&ConversationConfig::default(), &RateLimitConfig::default())
    }
}
