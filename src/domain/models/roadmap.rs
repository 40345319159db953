#[cfg(test)]
#[path = "roadmap_test.rs"]
mod tests;

use std::collections::BTreeMap;

use anyhow::bail;
use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Debug, PartialEq, Eq)]
pub struct Roadmap {
    pub category: &'static str,
    pub name: &'static str,
    pub steps: &'static [&'static str],
}

impl Roadmap {
    pub fn key(&self) -> String {
        return format!("{}/{}", self.category, self.name);
    }
}

pub const ROADMAPS: &[Roadmap] = &[
    Roadmap {
        category: "Roles",
        name: "Fullstack Developer",
        steps: &[
            "Learn HTML, CSS, JavaScript",
            "Master frontend frameworks (React, Vue)",
            "Learn backend development (Node.js, Django)",
            "Understand databases (SQL, NoSQL)",
            "Build fullstack projects",
        ],
    },
    Roadmap {
        category: "Roles",
        name: "Data Scientist",
        steps: &[
            "Learn Python and R",
            "Study statistics and probability",
            "Master data visualization tools",
            "Learn machine learning algorithms",
            "Work on real-world datasets",
        ],
    },
    Roadmap {
        category: "Projects",
        name: "Mood Tracking App",
        steps: &[
            "Define app features and requirements",
            "Design UI/UX mockups",
            "Set up backend and database",
            "Develop frontend interface",
            "Test and deploy the app",
        ],
    },
    Roadmap {
        category: "Projects",
        name: "Company Website",
        steps: &[
            "Gather client requirements",
            "Create wireframes and design",
            "Develop frontend with responsive design",
            "Implement backend functionalities",
            "Launch and maintain the website",
        ],
    },
    Roadmap {
        category: "Projects",
        name: "Video Game",
        steps: &[
            "Conceptualize game idea and mechanics",
            "Create storyboards and character designs",
            "Develop game engine and physics",
            "Design levels and environments",
            "Test, debug, and release the game",
        ],
    },
    Roadmap {
        category: "Skills-Tools",
        name: "Python",
        steps: &[
            "Learn basic syntax and data structures",
            "Understand OOP concepts",
            "Explore libraries (Pandas, NumPy)",
            "Work on small projects",
            "Contribute to open-source",
        ],
    },
    Roadmap {
        category: "Skills-Tools",
        name: "SQL",
        steps: &[
            "Learn basic SQL commands",
            "Understand database design",
            "Practice complex queries",
            "Work with real databases",
            "Optimize database performance",
        ],
    },
    Roadmap {
        category: "Skills-Tools",
        name: "Large Language Models",
        steps: &[
            "Understand NLP fundamentals",
            "Study transformer architecture",
            "Experiment with pre-trained models",
            "Fine-tune models for specific tasks",
            "Deploy models in applications",
        ],
    },
];

pub fn find_roadmap(category: &str, name: &str) -> Option<&'static Roadmap> {
    return ROADMAPS.iter().find(|e| {
        return e.category.eq_ignore_ascii_case(category.trim())
            && e.name.eq_ignore_ascii_case(name.trim());
    });
}

/// Completion state of every roadmap the user has touched, keyed by
/// `category/name` and then by zero based step index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapProgress {
    #[serde(default)]
    pub items: BTreeMap<String, BTreeMap<usize, bool>>,
}

impl RoadmapProgress {
    pub fn set_step(&mut self, roadmap: &Roadmap, step: usize, done: bool) -> Result<()> {
        if step >= roadmap.steps.len() {
            bail!(format!(
                "Step {} does not exist in {}. It has {} steps.",
                step + 1,
                roadmap.name,
                roadmap.steps.len()
            ));
        }

        self.items
            .entry(roadmap.key())
            .or_default()
            .insert(step, done);

        return Ok(());
    }

    pub fn is_done(&self, roadmap: &Roadmap, step: usize) -> bool {
        return self
            .items
            .get(&roadmap.key())
            .and_then(|steps| return steps.get(&step).copied())
            .unwrap_or(false);
    }

    pub fn completed(&self, roadmap: &Roadmap) -> usize {
        return (0..roadmap.steps.len())
            .filter(|idx| return self.is_done(roadmap, *idx))
            .count();
    }

    pub fn percent(&self, roadmap: &Roadmap) -> usize {
        if roadmap.steps.is_empty() {
            return 0;
        }

        return self.completed(roadmap) * 100 / roadmap.steps.len();
    }

    pub fn format(&self, roadmap: &Roadmap) -> String {
        let steps = roadmap
            .steps
            .iter()
            .enumerate()
            .map(|(idx, step)| {
                let mark = if self.is_done(roadmap, idx) { "x" } else { " " };
                return format!("[{mark}] {n}. {step}", n = idx + 1);
            })
            .collect::<Vec<String>>()
            .join("\n");

        return format!(
            "{name} Roadmap ({category}) - {percent}% complete\n{steps}",
            name = roadmap.name,
            category = roadmap.category,
            percent = self.percent(roadmap)
        );
    }
}
