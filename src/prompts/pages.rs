//! Phase 4: layout, pages and contact form.

use super::PromptContext;

pub fn prompt(ctx: &PromptContext<'_>) -> String {
    let b = ctx.business;
    format!(
        r#"You are the Pages agent. Components and homepage sections exist. Assemble the site for {name}.

{brief}

LAYOUT COMPONENTS (components/layout/):
1. Header.tsx: sticky, logo text "{name}", navigation, click-to-call button, mobile menu.
2. Footer.tsx: address, phone, email, hours, legal links, copyright {year}.

FORMS (components/forms/):
3. ContactForm.tsx: multi-step form with react-hook-form and zod validation, fields for
   name, email, phone, requested service (one of the services listed above) and message.
   Submit to /api/contact and show success and error states.

PAGES (app/):
4. app/layout.tsx: root layout with Header, Footer, fonts, and base metadata for "{slug}".
5. app/page.tsx: Hero, Stats, Services, Testimonials, FAQ, FinalCTA in that order.
6. app/contact/page.tsx: contact details plus ContactForm.
7. app/(pages)/mentions-legales/page.tsx: legal notice for a company in {country}.
8. app/(pages)/politique-confidentialite/page.tsx: privacy policy (GDPR).
9. components/layout/index.ts and components/forms/index.ts re-exports.

Run `npm run build` when done and fix any error it reports."#,
        name = b.name,
        brief = ctx.business_brief(),
        year = ctx.current_year,
        slug = ctx.site_slug,
        country = b.country,
    )
}
