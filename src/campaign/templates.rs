use crate::config::EmailConfig;
use crate::models::{Lead, OutreachKind};

#[derive(Debug, Clone, Copy)]
pub struct EmailTemplate {
    pub subject: &'static str,
    pub body: &'static str,
}

#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

const RESTAURANT: EmailTemplate = EmailTemplate {
    subject: "Help More Diners Find {business_name} Online",
    body: "Dear {business_name} Team,\n\n\
I noticed your restaurant while searching for local businesses in {location}, \
and I see you don't currently have a website. Most diners search online before \
visiting, so you may be missing out on customers.\n\n\
I'd like to offer a complete website package for {price}: a professional \
mobile-responsive site, menu showcase, contact and location details, and six \
months of support.\n\n\
Would you be open to a quick 10-minute call about helping {business_name} \
reach more customers?\n\n\
Best regards,\n{sender_name}\n{sender_phone}",
};

const RETAIL: EmailTemplate = EmailTemplate {
    subject: "Expand {business_name}'s Customer Reach with a Professional Website",
    body: "Dear {business_name} Team,\n\n\
I came across your store in {location} and noticed you don't have a website \
yet. Most shoppers research online before buying locally; a website can \
significantly increase your store's visibility.\n\n\
For a one-time {price} you get a custom-designed site with a product showcase, \
contact forms, map integration and six months of support.\n\n\
Can we schedule a brief call to discuss how a website can help {business_name} \
grow?\n\n\
Best regards,\n{sender_name}\n{sender_phone}",
};

const SERVICES: EmailTemplate = EmailTemplate {
    subject: "Build Trust and Credibility for {business_name} with a Website",
    body: "Dear {business_name},\n\n\
I discovered your business while researching service providers in {location} \
and noticed you're not online yet. Most customers check a business's website \
before contacting them.\n\n\
I offer an affordable package for service businesses ({price}): service \
descriptions, an online inquiry system, a testimonials section and six months \
of maintenance.\n\n\
Would you be open to a quick discussion about taking {business_name} online?\n\n\
Best regards,\n{sender_name}\n{sender_phone}",
};

const DEFAULT: EmailTemplate = EmailTemplate {
    subject: "Professional Website for {business_name} - {price} All-Inclusive",
    body: "Dear {business_name} Team,\n\n\
I noticed your business in {location} and wanted to reach out. I help local \
businesses establish their online presence affordably: a custom \
mobile-responsive website, contact forms, domain setup and six months of \
support for a one-time {price}.\n\n\
Can we schedule a brief call to discuss how a website can benefit \
{business_name}?\n\n\
Best regards,\n{sender_name}\n{sender_phone}",
};

const FOLLOW_UP_1: EmailTemplate = EmailTemplate {
    subject: "Following up: a website for {business_name}",
    body: "Hi {business_name} Team,\n\n\
I reached out a few days ago about building a website for your business in \
{location}. I know things get busy, so I wanted to check whether you had a \
chance to consider it.\n\n\
The full package is still {price}, one time, with six months of support \
included. Happy to answer any questions.\n\n\
Best regards,\n{sender_name}\n{sender_phone}",
};

const FOLLOW_UP_2: EmailTemplate = EmailTemplate {
    subject: "Last note: getting {business_name} online",
    body: "Hi {business_name} Team,\n\n\
This is my last note about getting {business_name} online. If a website isn't \
a priority right now, no problem at all; if it is, I'd love to help, and the \
{price} package stays available.\n\n\
Either way, I wish you the best with your business in {location}.\n\n\
Best regards,\n{sender_name}\n{sender_phone}",
};

/// Picks the initial template by category keyword, or the matching
/// follow-up template for later cadence stages.
pub fn template_for(kind: OutreachKind, category: Option<&str>) -> EmailTemplate {
    match kind {
        OutreachKind::Initial => {
            let category = category.map(|c| c.to_lowercase()).unwrap_or_default();
            if category.contains("restaurant")
                || category.contains("cafe")
                || category.contains("food")
            {
                RESTAURANT
            } else if category.contains("retail")
                || category.contains("shop")
                || category.contains("store")
            {
                RETAIL
            } else if category.contains("service") || category.contains("repair") {
                SERVICES
            } else {
                DEFAULT
            }
        }
        OutreachKind::FollowUp1 => FOLLOW_UP_1,
        OutreachKind::FollowUp2 => FOLLOW_UP_2,
    }
}

/// Substitutes the personalization placeholders. Unknown placeholders are
/// left verbatim so a template typo is visible in review sends.
pub fn render(template: EmailTemplate, lead: &Lead, location: &str, email: &EmailConfig) -> RenderedEmail {
    let price = format!("${}", email.service_price);
    let substitute = |text: &str| {
        text.replace("{business_name}", &lead.name)
            .replace("{location}", location)
            .replace("{price}", &price)
            .replace("{sender_name}", &email.from_name)
            .replace("{sender_phone}", &email.sender_phone)
    };

    RenderedEmail {
        subject: substitute(template.subject),
        body: substitute(template.body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::LeadStatus;
    use chrono::Utc;

    fn lead(category: &str) -> Lead {
        Lead {
            id: 1,
            name: "Blue Moon Bakery".into(),
            category: Some(category.into()),
            address: "42 Congress Ave".into(),
            phone: None,
            email: Some("hi@example.com".into()),
            has_website: false,
            rating: Some(4.0),
            review_count: 10,
            priority_score: 70,
            status: LeadStatus::New,
            last_contacted_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn initial_template_is_keyed_by_category() {
        assert_eq!(
            template_for(OutreachKind::Initial, Some("Thai Restaurant")).subject,
            RESTAURANT.subject
        );
        assert_eq!(
            template_for(OutreachKind::Initial, Some("Gift Shop")).subject,
            RETAIL.subject
        );
        assert_eq!(
            template_for(OutreachKind::Initial, Some("Auto Repair")).subject,
            SERVICES.subject
        );
        assert_eq!(
            template_for(OutreachKind::Initial, None).subject,
            DEFAULT.subject
        );
    }

    #[test]
    fn follow_up_kinds_ignore_category() {
        assert_eq!(
            template_for(OutreachKind::FollowUp1, Some("Cafe")).subject,
            FOLLOW_UP_1.subject
        );
        assert_eq!(
            template_for(OutreachKind::FollowUp2, Some("Cafe")).subject,
            FOLLOW_UP_2.subject
        );
    }

    #[test]
    fn render_substitutes_all_placeholders() {
        let config = Config::default();
        let rendered = render(
            template_for(OutreachKind::Initial, Some("Bakery Food")),
            &lead("Bakery Food"),
            &config.area.location,
            &config.email,
        );

        assert!(rendered.subject.contains("Blue Moon Bakery"));
        assert!(rendered.body.contains("Austin, Texas"));
        assert!(rendered.body.contains("$15000"));
        assert!(!rendered.body.contains("{business_name}"));
        assert!(!rendered.body.contains("{price}"));
    }
}
