// Prompt text for resume generation. The prompt is assembled from fixed
// segments with the caller's inputs placed between them, in this order:
//   PREAMBLE, template, INSTRUCTIONS, resume, JOB_DESCRIPTION_HEADER, job description, CLOSING

/// Opening of every generation prompt. Output always starts with this.
pub const PREAMBLE: &str = "You are a professional resume writer. \
Generate a LaTeX resume optimized for the job description below.
You are allowed to bluff but do not MAKE UP ANY stats. \
For the same experience, use the keywords from the job description to generate the resume.

LATEX TEMPLATE TO FILL:
";

pub const INSTRUCTIONS: &str = r#"

INSTRUCTIONS:
1. Replace placeholders like {{NAME}}, {{EMAIL}}, {{EXPERIENCE}} with actual content
2. For {{EXPERIENCE}}: Select 2-4 most relevant jobs from resume and format as:
\subsection*{Job Title -- Company \hfill Dates}
\begin{itemize}[leftmargin=*,noitemsep]
    \item Achievement (quantified if numbers available)
    \item Achievement
\end{itemize}

3. For {{SUMMARY}}: Write 2-3 sentences highlighting experience relevant to this job
4. For {{SKILLS}}: Include only skills relevant to job description
5. Use ONLY information from the resume below - DO NOT fabricate

CRITICAL:
- Return ONLY the complete LaTeX code
- Start with \documentclass
- Escape special characters: % → \%, & → \&, # → \#
- Do not include markdown code blocks

USER'S RESUME:
"#;

pub const JOB_DESCRIPTION_HEADER: &str = "\n\nJOB DESCRIPTION:\n";

pub const CLOSING: &str = "\n\nGenerate the complete LaTeX document now:";
