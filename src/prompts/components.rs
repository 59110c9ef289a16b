//! Phase 2: reusable UI components.

use super::PromptContext;

pub fn prompt(ctx: &PromptContext<'_>) -> String {
    format!(
        r#"You are the Components agent. The Next.js project skeleton already exists. Build the reusable UI kit for {name}.

{brief}

Create in components/ui/:
1. Button.tsx: variants primary, secondary, outline, ghost; sizes sm, md, lg; loading state;
   optional icon; renders as a link when given href; forwards refs.
2. Input.tsx and Textarea.tsx: label, error message, helper text, accessible ids.
3. Card.tsx: Card, CardHeader, CardContent, CardFooter with hover elevation.
4. Accordion.tsx: keyboard accessible, animated with framer-motion, one item open at a time.
5. Tabs.tsx: controlled and uncontrolled usage, aria roles.
6. index.ts re-exporting every component.

Also create lib/utils.ts exporting cn() built on clsx and tailwind-merge.

Use the Tailwind theme colors (primary, accent) instead of hard-coded hex values.
Every component must type-check under strict TypeScript."#,
        name = ctx.business.name,
        brief = ctx.business_brief(),
    )
}
