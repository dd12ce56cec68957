//! Quick-reply chips shown under a bot reply.

use crate::catalog::{render, LanguageCatalog};
use crate::context::ServiceContext;
use crate::response::{BotResponse, ResponseType};

pub const MAX_SUGGESTIONS: usize = 4;

#[derive(Default)]
struct Chips(Vec<String>);

impl Chips {
    fn push(&mut self, chip: String) {
        if !chip.trim().is_empty() && !self.0.contains(&chip) {
            self.0.push(chip);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.0.truncate(MAX_SUGGESTIONS);
        self.0
    }
}

/// At most four distinct, localised follow-up prompts for `response`.
pub fn generate_suggestions(
    response: &BotResponse,
    context: &ServiceContext,
    catalog: &LanguageCatalog,
) -> Vec<String> {
    let phrases = &catalog.phrases;
    let service = response
        .service
        .as_deref()
        .or(context.current_service.as_deref());
    let title = service.map(|name| catalog.title_of(name));
    let pricing_for = |title: &str| render(&phrases.suggest_pricing, &[("title", title)]);
    let more_about = |title: &str| render(&phrases.suggest_more, &[("title", title)]);

    let mut chips = Chips::default();
    match (response.response_type, title.as_deref()) {
        (ResponseType::Service | ResponseType::ContextualFollowup, Some(title)) => {
            chips.push(pricing_for(title));
            chips.push(more_about(title));
            chips.push(phrases.suggest_book.clone());
            chips.push(phrases.suggest_contact.clone());
        }
        (ResponseType::Pricing, Some(title)) => {
            chips.push(phrases.suggest_book.clone());
            if context.service_history.len() > 1 {
                chips.push(phrases.suggest_compare.clone());
            }
            chips.push(more_about(title));
            chips.push(phrases.suggest_contact.clone());
            chips.push(phrases.suggest_services.clone());
        }
        (ResponseType::Contact, _) => {
            chips.push(phrases.suggest_book.clone());
            chips.push(phrases.suggest_services.clone());
            chips.push(phrases.suggest_general_pricing.clone());
        }
        (ResponseType::Insight, _) => {
            chips.push(phrases.suggest_contact.clone());
            if context.service_history.len() > 1 {
                chips.push(phrases.suggest_compare.clone());
            }
            chips.push(phrases.suggest_book.clone());
            if let Some(title) = title.as_deref() {
                chips.push(pricing_for(title));
            }
        }
        (ResponseType::CommonQuestion, _) => {
            chips.push(phrases.suggest_general_pricing.clone());
            let focus = title
                .clone()
                .or_else(|| catalog.services.first().map(|s| s.title().to_string()));
            if let Some(focus) = focus.as_deref() {
                chips.push(more_about(focus));
            }
            chips.push(phrases.suggest_contact.clone());
            chips.push(phrases.suggest_book.clone());
        }
        (_, title) => {
            chips.push(phrases.suggest_services.clone());
            if let Some(title) = title {
                chips.push(pricing_for(title));
            } else {
                chips.push(phrases.suggest_general_pricing.clone());
            }
            chips.push(phrases.suggest_contact.clone());
        }
    }
    chips.finish()
}
