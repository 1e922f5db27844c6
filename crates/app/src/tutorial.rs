use crossword_core::model::Topic;

/// One step of a topic's tutorial timeline: reading text, a video, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub content: Option<&'static str>,
    pub video: Option<&'static str>,
}

const fn text(title: &'static str, content: &'static str) -> Section {
    Section {
        title,
        content: Some(content),
        video: None,
    }
}

const fn video(title: &'static str, url: &'static str) -> Section {
    Section {
        title,
        content: None,
        video: Some(url),
    }
}

const SCRUM: &[Section] = &[
    text(
        "Introduction to Scrum",
        "Scrum is an agile framework for collaborating on complex work. Work is organized in short cycles called sprints, so value is delivered continuously and the plan adapts as things change.",
    ),
    video(
        "Video: Scrum fundamentals",
        "https://www.youtube.com/embed/sLexw-z13Fo",
    ),
    text(
        "Scrum roles",
        "The Product Owner represents the business, the Scrum Master facilitates the process and keeps the team on agile practices, and the Developers build the product.",
    ),
    text(
        "Scrum events",
        "Sprint Planning, the Daily Scrum, the Sprint Review and the Sprint Retrospective give the work its rhythm and make inspection and adaptation routine.",
    ),
    video(
        "Video: The sprint cycle",
        "https://www.youtube.com/embed/7yIZOOXZjaU",
    ),
    text(
        "Scrum artifacts",
        "The Product Backlog is the ordered list of everything the product needs. The Sprint Backlog holds the items chosen for the sprint. The Increment is the usable result delivered at the end of each sprint.",
    ),
    text(
        "Ordering and adapting",
        "Continuous ordering of the Product Backlog and regular retrospectives let the team change course quickly to maximize the value it delivers.",
    ),
    video(
        "Video: Teams using Scrum in practice",
        "https://www.youtube.com/embed/N6uXuaVRoY8",
    ),
    text(
        "Benefits and challenges",
        "Scrum improves collaboration and keeps the focus on value, but it asks for discipline and commitment from the team and has to be fitted to each kind of project.",
    ),
    text(
        "Wrap-up",
        "Scrum lets teams work effectively in complex environments. It succeeds through communication, transparency and team commitment.",
    ),
];

const PMBOK: &[Section] = &[
    text(
        "Introduction to PMBOK",
        "The PMBOK Guide from the Project Management Institute collects standard good practices for planning, executing and closing complex projects.",
    ),
    video(
        "Video: PMBOK fundamentals",
        "https://www.youtube.com/embed/ru6mmukL_6A",
    ),
    text(
        "Knowledge areas",
        "PMBOK covers ten knowledge areas: integration, scope, schedule, cost, quality, resources, communications, risk, procurement and stakeholders.",
    ),
    text(
        "Processes",
        "Each knowledge area breaks down into processes that run from planning and execution to monitoring, control and closing.",
    ),
    video(
        "Video: The knowledge areas",
        "https://www.youtube.com/embed/IWxfAwS18Mc",
    ),
    text(
        "Project life cycle",
        "A project moves through five process groups: initiating, planning, executing, monitoring and controlling, and closing.",
    ),
    text(
        "Adapting and improving",
        "The project plan is refined continuously so the project can follow changing requirements without losing control of its objectives.",
    ),
    video(
        "Video: Applying PMBOK",
        "https://www.youtube.com/embed/Og7iI31kwPQ",
    ),
    text(
        "Benefits and challenges",
        "PMBOK gives a thorough, standardized base for project management, though small or fast-moving projects may need to trim its processes.",
    ),
    text(
        "Wrap-up",
        "PMBOK is most valuable on large, complex projects, where its systematic approach keeps the work under control.",
    ),
];

#[must_use]
pub fn material(topic: Topic) -> &'static [Section] {
    match topic {
        Topic::Scrum => SCRUM,
        Topic::Pmbok => PMBOK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_topic_has_reading_and_videos() {
        for topic in Topic::ALL {
            let sections = material(topic);
            assert!(sections.iter().any(|s| s.content.is_some()), "{topic}");
            assert!(sections.iter().any(|s| s.video.is_some()), "{topic}");
            assert!(sections.iter().all(|s| s.content.is_some() != s.video.is_some()));
        }
    }
}
