//! Deploy phase: ship the published repository to Vercel.

use std::collections::BTreeMap;

use serde::Serialize;

use super::PromptContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPayload {
    pub project_path: String,
    pub project_name: String,
    pub business_data: DeployBusiness,
    /// `owner/repo`
    pub github_repo: String,
    pub vercel_config: VercelConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployBusiness {
    pub name: String,
    pub city: String,
    pub site_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelConfig {
    pub custom_domain: Option<String>,
    pub framework: &'static str,
    pub env_vars: BTreeMap<&'static str, String>,
}

impl DeployPayload {
    pub fn new(ctx: &PromptContext<'_>, repo_url: &str) -> Self {
        let site_url = ctx.business.expected_site_url(ctx.site_slug);
        let mut env_vars = BTreeMap::new();
        env_vars.insert("NEXT_PUBLIC_SITE_URL", site_url.clone());
        env_vars.insert("NEXT_PUBLIC_CONTACT_EMAIL", ctx.business.email.clone());
        Self {
            project_path: ctx.site_dir.display().to_string(),
            project_name: ctx.site_slug.to_string(),
            business_data: DeployBusiness {
                name: ctx.business.name.clone(),
                city: ctx.business.city.clone(),
                site_url,
            },
            github_repo: owner_repo(repo_url),
            vercel_config: VercelConfig {
                custom_domain: ctx.business.custom_domain(),
                framework: "nextjs",
                env_vars,
            },
        }
    }
}

fn owner_repo(repo_url: &str) -> String {
    repo_url
        .trim_start_matches("https://github.com/")
        .trim_end_matches('/')
        .to_string()
}

pub fn prompt(ctx: &PromptContext<'_>, repo_url: &str) -> String {
    let payload = DeployPayload::new(ctx, repo_url);
    let payload = serde_json::to_string_pretty(&payload).unwrap_or_default();
    format!(
        r#"You are the Vercel deployer. Deploy this Next.js project to Vercel with the following configuration:

{payload}

Steps:
1. Make sure the project builds locally (`npm run build`).
2. Link or create the Vercel project projectName with the `vercel` CLI, authenticated
   through VERCEL_TOKEN (pass --token "$VERCEL_TOKEN" and --yes).
3. Set every variable of vercelConfig.envVars for the production environment.
4. Deploy to production with `vercel deploy --prod`.
5. If customDomain is set, attach it to the project and report the DNS records needed.

When done, answer ONLY with a JSON object:
{{
  "success": true,
  "vercel_url": "https://<project>.vercel.app",
  "production_url": "<custom domain URL or the vercel_url>",
  "message": "Vercel deployment succeeded"
}}

If something fails, answer:
{{
  "success": false,
  "error": "<what went wrong>",
  "message": "Vercel deployment failed"
}}"#
    )
}
