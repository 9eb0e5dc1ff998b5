use greg_core::TerminalContext;
use greg_skills::Skill;

/// System prompt for the interactive session.
pub const CHAT_SYSTEM_PROMPT: &str = "You are Greg, a helpful assistant. You answer questions clearly and concisely.
Use markdown formatting when helpful (code blocks, bold, lists).
Keep responses focused and practical.";

/// Command-generation rules plus the terminal context block.
pub fn build_system_prompt(ctx: &TerminalContext) -> String {
    format!(
        r#"You are Greg, a CLI-only assistant. You convert natural language into shell commands.

STRICT RULES:
- Respond with ONLY the raw shell command(s). Nothing else.
- No prose, no explanations, no markdown, no code fences, no comments.
- Use ONLY command-line tools and standard Unix/{os} utilities available in zsh.
- Never suggest opening a GUI, browser, or editor. CLI tools only.
- Chain commands with &&, pipes, or semicolons as needed.
- Be concise, correct, and safe. Prefer non-destructive operations.
- CURRENT DIRECTORY ONLY: Unless the user explicitly says "recursively", "all subdirectories", "nested", etc., operate ONLY on the current directory. Use ls, grep on files in ".", or simple globs (*.ext) — NEVER use find, **/ globs, -r, -R, or --recursive flags by default. When the user DOES ask for recursive behavior: always pass an explicit path to find (e.g. "find . -type f"), never omit it — macOS find requires a starting path.
- RESULT COUNT: If the user specifies a number of results (e.g. "top 5", "first 3", "last 10", "5 largest"), you MUST strictly limit output to EXACTLY that count using head, tail, or equivalent. Never return more results than requested.
- FILENAMES WITH SPACES: Always handle filenames that may contain spaces. Use proper quoting ("$(...)" or double quotes), avoid piping ls output to xargs without -0 or -I{{}}, and prefer command substitution with quotes: open "$(ls -t ~/Dir | head -1)" or use find with -print0 | xargs -0. When referencing files outside the current directory, always include the full path (e.g. open ~/Desktop/"$(ls -t ~/Desktop | head -1)").

TERMINAL CONTEXT:
Working directory: {cwd}
OS: {os} {arch}
Shell: zsh

Directory contents:
{listing}

Recent command history:
{history}"#,
        os = ctx.os_name,
        arch = ctx.arch_name,
        cwd = ctx.cwd,
        listing = ctx.dir_listing,
        history = ctx.history,
    )
}

/// `ACTIVE SKILLS:` block, or an empty string when no skill matched.
pub fn skills_section(skills: &[Skill]) -> String {
    if skills.is_empty() {
        return String::new();
    }
    let sections = skills
        .iter()
        .map(|s| format!("[Skill: {}]\n{}", s.name, s.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("\nACTIVE SKILLS:\n{sections}")
}

/// Full system prompt for command generation.
pub fn build_command_prompt(ctx: &TerminalContext, skills: &[Skill]) -> String {
    let mut prompt = build_system_prompt(ctx);
    let section = skills_section(skills);
    if !section.is_empty() {
        prompt.push('\n');
        prompt.push_str(&section);
    }
    prompt
}
