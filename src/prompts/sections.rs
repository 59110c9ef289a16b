//! Phase 3: homepage sections.

use super::PromptContext;

pub fn prompt(ctx: &PromptContext<'_>) -> String {
    let b = ctx.business;
    let service_cards = b
        .service_list()
        .iter()
        .map(|s| format!("   - {}", s))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"You are the Sections agent. UI components exist in components/ui/. Build the homepage sections for {name} in components/sections/.

{brief}

SECTIONS:
1. Hero.tsx: headline built on "{positioning}", sub-headline naming {city}, primary CTA
   "call {phone}", secondary CTA to the contact page, subtle framer-motion entrance.
2. Stats.tsx: key figures including {years} years of experience, animated counters.
3. Services.tsx: one card per service with a lucide-react icon and a two-sentence description:
{service_cards}
4. Testimonials.tsx: three plausible customer testimonials from {location}.
5. FAQ.tsx: six questions about {sector} using the Accordion component.
6. FinalCTA.tsx: closing call to action with phone, email and opening hours ({hours}).
7. index.ts re-exporting all sections.

Write the copy in the language customers in {country} expect for this business."#,
        name = b.name,
        brief = ctx.business_brief(),
        positioning = b.positioning,
        city = b.city,
        phone = b.phone,
        years = ctx.years_in_business(),
        service_cards = service_cards,
        location = b.location,
        sector = b.primary_service(),
        hours = b.hours,
        country = b.country,
    )
}
