//! Phase 5: SEO, structured data and remaining content.

use super::PromptContext;

pub fn prompt(ctx: &PromptContext<'_>) -> String {
    let b = ctx.business;
    let site_url = b.expected_site_url(ctx.site_slug);
    format!(
        r#"You are the Content agent. The site for {name} is assembled. Add SEO and the finishing content.

{brief}

SITE URL: {site_url}

FILES:
1. components/seo/StructuredData.tsx: JSON-LD LocalBusiness with name, address
   ({street}, {postal_code} {city}, {country}), telephone, email, opening hours,
   foundingDate {year}, areaServed "{location}" and the service catalogue.
2. public/sitemap.xml listing every page under {site_url}.
3. public/robots.txt allowing all crawlers and pointing to the sitemap.
4. public/manifest.json using the primary color {primary} as theme color.
5. Update app/layout.tsx: include StructuredData, complete metadata (title template,
   description, keywords for {sector} in {city}, Open Graph, canonical {site_url}).
6. app/api/contact/route.ts: POST handler validating the form payload with zod and
   returning JSON.
7. components/seo/index.ts re-export and a README.md describing how to run the site.

Finish by running `npm run build`; the build must succeed."#,
        name = b.name,
        brief = ctx.business_brief(),
        site_url = site_url,
        street = b.street,
        postal_code = b.postal_code,
        city = b.city,
        country = b.country,
        year = b.year,
        location = b.location,
        primary = b.primary_color,
        sector = b.primary_service(),
    )
}
