//! Phase 1: project skeleton and toolchain configuration.

use super::PromptContext;

pub fn prompt(ctx: &PromptContext<'_>) -> String {
    let b = ctx.business;
    format!(
        r#"You are the Setup agent. Create the structure and configuration of a modern Next.js 14 project (App Router, strict TypeScript, Tailwind CSS).

{brief}

TASKS:
1. Create package.json named "{slug}" with scripts dev/build/start/lint and these dependencies:
   next ^14.2, react ^18.3, react-dom ^18.3, framer-motion, lucide-react, react-hook-form, zod,
   @hookform/resolvers, clsx, tailwind-merge; dev: typescript ^5, @types/node, @types/react,
   @types/react-dom, tailwindcss ^3.4, postcss, autoprefixer, eslint, eslint-config-next.
2. Create tailwind.config.ts with a full shade scale (50-900) generated around
   primary {primary} and accent {secondary}, container defaults, and font families.
3. Create next.config.mjs with image optimisation (avif, webp), compression, strict mode,
   and security headers.
4. Create tsconfig.json (strict, "@/*" path alias), postcss.config.mjs, .eslintrc.json,
   .gitignore and next-env.d.ts.
5. Create app/globals.css with Tailwind layers and CSS variables for both colors.
6. Create the folders app/, components/ui/, components/sections/, components/layout/,
   components/forms/, components/seo/, lib/ and public/.
7. Run `npm install` in the project directory and make sure it succeeds.

Only create files inside the project directory. Do not start a dev server."#,
        brief = ctx.business_brief(),
        slug = ctx.site_slug,
        primary = b.primary_color,
        secondary = b.secondary_color,
    )
}
