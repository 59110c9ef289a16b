//! Validation and auto-fix prompts.

use std::path::Path;

/// Ask the agent to audit the site and end with an explicit verdict.
pub fn validation_prompt(site_dir: &Path, attempt: u32, max_attempts: u32) -> String {
    format!(
        r#"You are the site validator. Check that the generated Next.js site is ready for production.

PROJECT: {dir}

Validate, in order:
1. Structure: required files and folders, Next.js App Router conventions.
2. UI and CSS: Tailwind configuration, responsive layout, consistent design tokens.
3. Images: next/image usage, alt text, sizes.
4. Functionality: run `npm run build`; report every TypeScript and build error.
5. Content: metadata, JSON-LD, sitemap, robots.txt, accessibility basics.
6. Performance: obvious anti-patterns (unoptimised images, blocking scripts).

Do not modify any file.

Write a report listing every problem as file:line with a severity of CRITICAL, HIGH,
MEDIUM or LOW. End the report with exactly one of these lines:
SAFE TO DEPLOY
FAILED

Attempt {attempt}/{max_attempts}"#,
        dir = site_dir.display(),
    )
}

/// Ask the agent to repair what the last validation reported.
pub fn fix_prompt(site_dir: &Path, report: &str, attempt: u32) -> String {
    format!(
        r#"The Next.js site you generated failed validation. Fix every reported problem.

VALIDATION REPORT (attempt {attempt}):
{report}

PROJECT: {dir}

INSTRUCTIONS:
1. Read every problem in the report.
2. For each CRITICAL or HIGH problem, open the file, fix the cause, and make sure the
   fix does not introduce new errors.
3. Priorities: TypeScript errors, build errors (missing modules, syntax), missing or
   broken components, configuration files.
4. When everything is fixed run: cd {dir} && npm run build
5. Confirm the build succeeds."#,
        dir = site_dir.display(),
    )
}
