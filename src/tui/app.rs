use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use ratatui::widgets::TableState;

use tasker::backup::{export_tasks, import_tasks};
use tasker::commands::{load_current, load_for_change};
use tasker::config::Config;
use tasker::dates::now_local;
use tasker::error::{Result, TaskerError};
use tasker::models::{Category, DailyTemplate, Field, Priority, Task, TaskId};
use tasker::rollover::RolloverTimer;
use tasker::storage::TaskStore;
use tasker::tasks::{
    attach_image, complete_task, create_task, delete_task, find_task, set_status, update_task,
    NewTask, TaskUpdate,
};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

pub enum ViewMode {
    Tasks,
    Templates,
}

/// What the single-line input box edits in `InputMode::Editing`.
#[derive(Clone, Copy, PartialEq)]
pub enum InputField {
    None,
    Title,
    Task(Field),
    Priority,
    ImportPath,
}

/// One prompt of the add wizard.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AddStep {
    Title,
    Category,
    Field(Field),
    Priority,
}

/// State for the multi-step "Add" wizard.
///
/// The prompts after the category depend on the fields that category declares.
#[derive(Default)]
pub struct AddState {
    pub step: usize,
    pub title: String,
    pub category: Option<Category>,
    pub values: Vec<(Field, String)>,
    pub priority: Option<Priority>,
    /// Adding a daily template instead of a task.
    pub template: bool,
}

impl AddState {
    pub fn steps(&self) -> Vec<AddStep> {
        if self.template {
            return vec![
                AddStep::Title,
                AddStep::Field(Field::Time),
                AddStep::Field(Field::Details),
                AddStep::Priority,
            ];
        }
        let mut steps = vec![AddStep::Title, AddStep::Category];
        if let Some(c) = self.category {
            steps.extend(c.fields().iter().map(|f| AddStep::Field(*f)));
        }
        steps.push(AddStep::Priority);
        steps
    }

    pub fn current(&self) -> Option<AddStep> {
        self.steps().get(self.step).copied()
    }

    fn value(&self, field: Field) -> Option<String> {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.clone())
    }
}

pub struct App {
    pub store: TaskStore,
    pub config: Config,
    pub tasks: Vec<Task>,
    pub templates: Vec<DailyTemplate>,
    pub state: TableState,
    pub template_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<TaskId>,
    pub add_state: AddState,
    pub show_completed: bool,
    pub filter: Option<Category>,
    pub rollover: RolloverTimer,
    pub status_message: Option<String>,
    pub now: NaiveDateTime,
}

impl App {
    /// Creates a new App instance and loads initial data.
    pub fn new(store: TaskStore, config: Config) -> App {
        let now = now_local();
        let mut app = App {
            store,
            config,
            tasks: Vec::new(),
            templates: Vec::new(),
            state: TableState::default(),
            template_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            show_completed: false,
            filter: None,
            rollover: RolloverTimer::new(now),
            status_message: None,
            now,
        };
        app.reload();
        app
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let (len, state) = self.current_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn current_list(&mut self) -> (usize, &mut TableState) {
        match self.view_mode {
            ViewMode::Tasks => (self.tasks.len(), &mut self.state),
            ViewMode::Templates => (self.templates.len(), &mut self.template_state),
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        if let ViewMode::Templates = self.view_mode {
            return None;
        }
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Loads the stored tasks, applies `f`, saves them and reloads the view.
    ///
    /// The message returned by `f`, or its error, ends up in the status line.
    fn mutate<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Vec<Task>, NaiveDateTime) -> Result<String>,
    {
        let now = now_local();
        let outcome = load_for_change(&self.store, now).and_then(|mut tasks| {
            let msg = f(&mut tasks, now)?;
            self.store.save(&tasks)?;
            Ok(msg)
        });
        self.status_message = Some(match outcome {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("{}", e);
                e.to_string()
            }
        });
        self.reload();
    }

    /// Marks the currently selected task as complete.
    pub fn complete_selected(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
            self.mutate(|tasks, now| {
                let t = complete_task(tasks, &id, now)?;
                Ok(format!("Completed '{}'", t.title))
            });
        }
    }

    /// Moves the selected task to its next status.
    pub fn cycle_status_selected(&mut self) {
        if let Some(t) = self.selected_task() {
            let id = t.id.clone();
            let status = t.status().next();
            self.mutate(|tasks, now| {
                let t = set_status(tasks, &id, status, now)?;
                Ok(format!("'{}' is now {}", t.title, status.label().to_lowercase()))
            });
        }
    }

    /// Deletes the currently selected task or template.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => {
                if let Some(id) = self.selected_task().map(|t| t.id.clone()) {
                    self.mutate(|tasks, _| {
                        let t = delete_task(tasks, &id)?;
                        Ok(format!("Deleted '{}'", t.title))
                    });
                }
            }
            ViewMode::Templates => {
                if let Some(i) = self.template_state.selected() {
                    if i < self.templates.len() {
                        let removed = self.templates.remove(i);
                        self.status_message = Some(match self.store.save_templates(&self.templates) {
                            Ok(()) => format!("Removed template '{}'", removed.title),
                            Err(e) => e.to_string(),
                        });
                        self.reload();
                    }
                }
            }
        }
    }

    /// Reloads tasks and templates from the store and refreshes the display list.
    pub fn reload(&mut self) {
        self.now = now_local();
        let mut tasks = match load_current(&self.store, &self.config, self.now) {
            Ok(tasks) => tasks,
            Err(e) => {
                log::warn!("pipeline failed, showing stored tasks: {}", e);
                self.status_message = Some(e.to_string());
                self.store.load()
            }
        };
        if !self.show_completed {
            tasks.retain(|t| !t.is_completed());
        }
        if let Some(c) = self.filter {
            tasks.retain(|t| t.category == c);
        }
        self.tasks = tasks;
        fix_selection(&mut self.state, self.tasks.len());

        self.templates = self.store.load_templates();
        fix_selection(&mut self.template_state, self.templates.len());
    }

    /// Runs the midnight rollover once its deadline has passed.
    pub fn on_tick(&mut self, now: NaiveDateTime) {
        match self.rollover.fire_if_due(&self.store, now) {
            Ok(Some(report)) => {
                self.status_message = Some(format!(
                    "New day: replaced {} daily tasks with {}",
                    report.removed, report.created
                ));
                self.reload();
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("rollover failed: {}", e);
                self.status_message = Some(e.to_string());
            }
        }
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    /// Cycles the category filter: all, event, daily, project, personal.
    pub fn cycle_filter(&mut self) {
        self.filter = match self.filter {
            None => Some(Category::ALL[0]),
            Some(c) => Category::ALL
                .iter()
                .position(|x| *x == c)
                .and_then(|i| Category::ALL.get(i + 1))
                .copied(),
        };
        self.reload();
    }

    /// Toggles between Task and Template views.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Templates,
            ViewMode::Templates => ViewMode::Tasks,
        };
    }

    /// Writes a backup of the stored tasks into the current directory.
    pub fn export(&mut self) {
        let tasks = self.store.load();
        self.status_message = Some(match export_tasks(&tasks, Path::new("."), self.now.date()) {
            Ok(path) => format!("Exported {} tasks to {}", tasks.len(), path.display()),
            Err(e) => e.to_string(),
        });
    }

    /// Initiates the "Add" wizard for a task or, in the templates view, a template.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState {
            template: matches!(self.view_mode, ViewMode::Templates),
            ..AddState::default()
        };
        self.input_buffer.clear();
    }

    /// Asks for the path of a backup file to import.
    pub fn start_import(&mut self) {
        self.input_mode = InputMode::Editing;
        self.input_field = InputField::ImportPath;
        self.target_id = None;
        self.input_buffer.clear();
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(t) = self.selected_task() else { return };
        if let InputField::Task(f) = field {
            if !t.category.allows(f) {
                self.status_message = Some(format!(
                    "{} tasks have no {}",
                    t.category,
                    f.label().to_lowercase()
                ));
                return;
            }
        }
        // Pre-fill buffer for editing
        let prefill = match field {
            InputField::Title => t.title.clone(),
            InputField::Task(Field::Details) => t.details.clone().unwrap_or_default(),
            InputField::Task(Field::Date) => t.date.clone().unwrap_or_default(),
            InputField::Task(Field::DueDate) => t.due_date.clone().unwrap_or_default(),
            InputField::Task(Field::Time) => t.time.clone().unwrap_or_default(),
            InputField::Task(Field::Location) => t.location.clone().unwrap_or_default(),
            InputField::Priority => t.priority.map(|p| p.to_string()).unwrap_or_default(),
            _ => String::new(),
        };
        self.target_id = Some(t.id.clone());
        self.input_mode = InputMode::Editing;
        self.input_field = field;
        self.input_buffer = prefill;
    }

    /// Edits whichever date field the selected task's category uses.
    pub fn start_edit_date(&mut self) {
        let field = match self.selected_task().map(|t| t.category) {
            Some(Category::Project) => Field::DueDate,
            Some(Category::Daily) => Field::Time,
            _ => Field::Date,
        };
        self.start_edit(InputField::Task(field));
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    /// Handles one answer of the "Add" wizard.
    fn handle_adding_input(&mut self) {
        let Some(step) = self.add_state.current() else {
            self.input_mode = InputMode::Normal;
            return;
        };
        let input = self.input_buffer.trim().to_string();
        match step {
            AddStep::Title => {
                if input.is_empty() {
                    return;
                }
                self.add_state.title = input;
            }
            AddStep::Category => match input.parse::<Category>() {
                Ok(c) => self.add_state.category = Some(c),
                Err(e) => {
                    self.status_message = Some(e.to_string());
                    return;
                }
            },
            AddStep::Field(field) => {
                if !input.is_empty() {
                    self.add_state.values.push((field, input));
                }
            }
            AddStep::Priority => {
                if !input.is_empty() {
                    match input.parse::<Priority>() {
                        Ok(p) => self.add_state.priority = Some(p),
                        Err(e) => {
                            self.status_message = Some(e.to_string());
                            return;
                        }
                    }
                }
            }
        }
        self.add_state.step += 1;
        self.input_buffer.clear();
        if self.add_state.current().is_none() {
            self.finish_add();
        }
    }

    fn finish_add(&mut self) {
        self.input_mode = InputMode::Normal;
        let add = std::mem::take(&mut self.add_state);
        if add.template {
            let template = DailyTemplate {
                title: add.title.clone(),
                details: add.value(Field::Details),
                time: add.value(Field::Time),
                priority: add.priority,
            };
            self.templates.push(template);
            self.status_message = Some(match self.store.save_templates(&self.templates) {
                Ok(()) => format!("Added template '{}'", add.title),
                Err(e) => e.to_string(),
            });
            self.reload();
            return;
        }

        let new = NewTask {
            title: add.title.clone(),
            category: add.category.unwrap_or_default(),
            details: add.value(Field::Details),
            date: add.value(Field::Date),
            due_date: add.value(Field::DueDate),
            time: add.value(Field::Time),
            location: add.value(Field::Location),
            priority: add.priority,
        };
        let image = add.value(Field::Image).map(PathBuf::from);
        self.mutate(move |tasks, now| {
            let task = create_task(tasks, new, now)?;
            if let Some(path) = image {
                attach_image(tasks, &task.id, &path, now)?;
            }
            Ok(format!("Added '{}'", task.title))
        });
    }

    /// Applies the edited value to the target task.
    fn handle_editing_input(&mut self) {
        let input = self.input_buffer.trim().to_string();
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();

        if self.input_field == InputField::ImportPath {
            if input.is_empty() {
                return;
            }
            self.status_message = Some(
                match import_tasks(&self.store, Path::new(&input), self.config.import_mode) {
                    Ok(r) => format!("Imported {} tasks ({} in store)", r.imported, r.total),
                    Err(e) => e.to_string(),
                },
            );
            self.reload();
            return;
        }

        let Some(id) = self.target_id.clone() else { return };
        let field = self.input_field;
        self.mutate(move |tasks, now| {
            let mut update = TaskUpdate::default();
            match field {
                InputField::Title => update.title = Some(input),
                InputField::Priority => update.priority = Some(input.parse()?),
                InputField::Task(Field::Image) => {
                    let t = attach_image(tasks, &id, Path::new(&input), now)?;
                    return Ok(format!("Image attached to '{}'", t.title));
                }
                InputField::Task(Field::Details) => update.details = Some(input),
                InputField::Task(Field::Date) => update.date = Some(input),
                InputField::Task(Field::DueDate) => update.due_date = Some(input),
                InputField::Task(Field::Time) => update.time = Some(input),
                InputField::Task(Field::Location) => update.location = Some(input),
                InputField::None | InputField::ImportPath => {
                    return Err(TaskerError::validation("nothing to edit"))
                }
            }
            let t = update_task(tasks, &id, update, now)?;
            Ok(format!("Updated '{}'", t.title))
        });
    }

    /// The task the edit box is working on, for its title.
    pub fn target(&self) -> Option<&Task> {
        self.target_id.as_ref().and_then(|id| find_task(&self.tasks, id))
    }
}

fn fix_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        if i >= len {
            state.select(Some(len - 1));
        }
    } else {
        state.select(Some(0));
    }
}
