use iced::widget::{
    button, canvas, column, container, row, scrollable, shader, slider, text, Column,
};
use iced::{clipboard, Alignment, Element, Length, Pixels, Task, Theme};
use iced_aw::Wrap;
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod gpu;
mod loader;
mod meta;
mod raw;
mod state;
mod ui;

use config::ViewerConfig;
use error::GpuError;
use gpu::{DeviceSlot, HistogramEngine, HistogramResult, OffscreenRenderer};
use loader::LoadedImage;
use state::edit::LightingField;
use state::{FileItem, LightingParams, ResultCache, ResultKey};

/// Main application state
struct RawViewer {
    config: ViewerConfig,
    /// Grouped contents of the open folder
    items: Vec<FileItem>,
    selected: Option<usize>,
    /// Decoded selection, `None` while loading
    image: Option<Arc<LoadedImage>>,
    lighting: LightingParams,
    /// Histograms of rendered results, keyed by source and lighting
    histograms: ResultCache<Arc<HistogramResult>>,
    /// Latest histogram of the selection, shown while a newer one runs
    last_histogram: Option<Arc<HistogramResult>>,
    histogram_pending: bool,
    renderer: Arc<OffscreenRenderer>,
    engine: Arc<HistogramEngine>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked the "Open Folder" button
    OpenFolder,
    FolderScanned(Result<Vec<FileItem>, String>),
    Select(usize),
    /// Finished load, tagged with the path it was started for
    Loaded(PathBuf, Result<Arc<LoadedImage>, String>),
    Adjust(LightingField, f32),
    ResetLighting,
    CopyLighting,
    /// Ask for the clipboard contents
    Paste,
    PasteLighting(Option<String>),
    HistogramReady(HistogramKey, Result<Arc<HistogramResult>, String>),
}

/// Which image a histogram belongs to, and under which lighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HistogramKey {
    source: ResultKey,
    result: ResultKey,
}

impl RawViewer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = ViewerConfig::load();
        let slot = Arc::new(DeviceSlot::new(config.gpu_power.into()));
        info!("🎨 RAW Viewer initialized");

        (
            RawViewer {
                histograms: ResultCache::new(config.result_cache_size),
                last_histogram: None,
                histogram_pending: false,
                renderer: Arc::new(OffscreenRenderer::new(Arc::clone(&slot))),
                engine: Arc::new(HistogramEngine::new(slot)),
                config,
                items: Vec::new(),
                selected: None,
                image: None,
                lighting: LightingParams::default(),
                status: String::from("Open a folder to start."),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenFolder => {
                // Show the native folder picker dialog
                let Some(folder) = FileDialog::new()
                    .set_title("Select Folder with Photos")
                    .pick_folder()
                else {
                    return Task::none();
                };

                self.status = format!("Scanning {}...", folder.display());
                Task::perform(state::scan_directory(folder), |result| {
                    Message::FolderScanned(result.map_err(|e| e.to_string()))
                })
            }
            Message::FolderScanned(Ok(items)) => {
                self.status = format!("{} items", items.len());
                self.items = items;
                self.selected = None;
                self.image = None;
                self.last_histogram = None;
                self.histograms.clear();
                Task::none()
            }
            Message::FolderScanned(Err(e)) => {
                self.status = format!("⚠️  Scan failed: {}", e);
                Task::none()
            }
            Message::Select(index) => {
                let Some(item) = self.items.get(index).cloned() else {
                    return Task::none();
                };
                self.selected = Some(index);
                self.image = None;
                self.last_histogram = None;
                self.status = format!("Loading {}...", item.name());

                let path = item.handle.path.clone();
                Task::perform(loader::load(item, self.config.sensor), move |result| {
                    Message::Loaded(path.clone(), result.map(Arc::new).map_err(|e| e.to_string()))
                })
            }
            Message::Loaded(path, result) => {
                let current = self
                    .selected
                    .and_then(|i| self.items.get(i))
                    .map(|item| item.handle.path.as_path());
                if current != Some(path.as_path()) {
                    // The user moved on before this load finished
                    return Task::none();
                }

                match result {
                    Ok(image) => {
                        let (width, height) = image.source.dimensions();
                        self.status = format!("{} ({}x{})", image.name, width, height);
                        self.image = Some(image);
                        self.request_histogram()
                    }
                    Err(e) => {
                        warn!("Failed to load {}: {}", path.display(), e);
                        self.status = format!("⚠️  {}", e);
                        Task::none()
                    }
                }
            }
            Message::Adjust(field, value) => {
                field.set(&mut self.lighting, value);
                self.request_histogram()
            }
            Message::ResetLighting => {
                self.lighting.reset();
                self.request_histogram()
            }
            Message::CopyLighting => match self.lighting.to_json() {
                Ok(json) => clipboard::write(json),
                Err(e) => {
                    self.status = format!("⚠️  Copy failed: {}", e);
                    Task::none()
                }
            },
            Message::Paste => clipboard::read().map(Message::PasteLighting),
            Message::PasteLighting(contents) => {
                match contents.as_deref().map(LightingParams::from_json) {
                    Some(Ok(params)) => {
                        self.lighting = params;
                        return self.request_histogram();
                    }
                    Some(Err(e)) => {
                        self.status = format!("⚠️  Clipboard is not a lighting preset: {}", e)
                    }
                    None => {}
                }
                Task::none()
            }
            Message::HistogramReady(key, result) => {
                self.histogram_pending = false;
                match result {
                    Ok(histogram) => {
                        if self.image.as_ref().is_some_and(|image| image.key == key.source) {
                            self.last_histogram = Some(Arc::clone(&histogram));
                        }
                        self.histograms.insert(key.result, histogram);
                    }
                    Err(e) => {
                        warn!("Histogram failed: {}", e);
                        return Task::none();
                    }
                }
                // Lighting may have moved on while this one ran
                self.request_histogram()
            }
        }
    }

    /// Key of the histogram for the current selection and lighting
    fn histogram_key(&self) -> Option<HistogramKey> {
        self.image.as_ref().map(|image| HistogramKey {
            source: image.key,
            result: image.key.with_lighting(&self.lighting),
        })
    }

    /// Render the thumbnail with the current lighting and histogram it
    ///
    /// One request runs at a time; the completion handler asks again, so
    /// the last lighting state is always picked up.
    fn request_histogram(&mut self) -> Task<Message> {
        if !self.config.histogram || self.histogram_pending {
            return Task::none();
        }
        let (Some(image), Some(key)) = (&self.image, self.histogram_key()) else {
            return Task::none();
        };
        if self.histograms.get(&key.result).is_some() {
            return Task::none();
        }

        let thumbnail = image.thumbnail.clone();
        let (width, height) = thumbnail.dimensions();
        let params = self.lighting;
        let sensor = self.config.sensor;
        let renderer = Arc::clone(&self.renderer);
        let engine = Arc::clone(&self.engine);
        self.histogram_pending = true;

        Task::perform(
            async move {
                let rendered = renderer.render(&thumbnail, &params, &sensor, width, height).await?;
                engine
                    .compute(rendered.width(), rendered.height(), rendered.as_raw())
                    .await
            },
            move |result: Result<HistogramResult, GpuError>| {
                Message::HistogramReady(key, result.map(Arc::new).map_err(|e| e.to_string()))
            },
        )
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let toolbar = row![
            button("Open Folder")
                .on_press(Message::OpenFolder)
                .padding(10),
            text(&self.status).size(16),
        ]
        .spacing(20)
        .align_y(Alignment::Center);

        let tiles: Vec<Element<Message>> = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| self.tile(index, item))
            .collect();
        let grid = Wrap::with_elements(tiles)
            .spacing(Pixels(8.0))
            .line_spacing(Pixels(8.0));
        let browser = scrollable(grid)
            .width(Length::Fixed(360.0))
            .height(Length::Fill);

        let viewer: Element<Message> = match &self.image {
            Some(image) => shader(ui::ImageView {
                source: image.source.clone(),
                key: image.key,
                params: self.lighting,
                sensor: self.config.sensor,
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into(),
            None => container(text("Select a photo"))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let content = row![browser, viewer, self.sidebar()]
            .spacing(20)
            .height(Length::Fill);

        column![toolbar, content]
            .spacing(20)
            .padding(20)
            .into()
    }

    fn tile<'a>(&'a self, index: usize, item: &'a FileItem) -> Element<'a, Message> {
        let sidecars = match item.sidecars.len() {
            0 => String::new(),
            1 => String::from("+1 sidecar"),
            n => format!("+{} sidecars", n),
        };
        let style: fn(&Theme, button::Status) -> button::Style = if self.selected == Some(index) {
            button::primary
        } else {
            button::secondary
        };

        button(column![text(item.name()).size(14), text(sidecars).size(11)].spacing(4))
            .width(Length::Fixed(160.0))
            .style(style)
            .on_press(Message::Select(index))
            .into()
    }

    fn sidebar(&self) -> Element<Message> {
        let mut panel: Column<Message> = Column::new().spacing(8).width(Length::Fixed(280.0));

        let histogram = self
            .histogram_key()
            .and_then(|key| self.histograms.get(&key.result))
            .or(self.last_histogram.as_ref());
        if let Some(histogram) = histogram {
            panel = panel.push(
                canvas(ui::Histogram {
                    data: Arc::clone(histogram),
                })
                .width(Length::Fill)
                .height(Length::Fixed(120.0)),
            );
        }

        for field in LightingField::ALL {
            let value = field.get(&self.lighting);
            panel = panel.push(text(format!("{}: {:.2}", field.label(), value)).size(12));
            panel = panel.push(
                slider(field.range(), value, move |v| Message::Adjust(field, v)).step(0.01f32),
            );
        }

        panel = panel.push(
            row![
                button("Reset").on_press_maybe(
                    (!self.lighting.is_unedited()).then_some(Message::ResetLighting)
                ),
                button("Copy").on_press(Message::CopyLighting),
                button("Paste").on_press(Message::Paste),
            ]
            .spacing(8),
        );

        if let Some(image) = &self.image {
            let rows = image.metadata.iter().fold(Column::new().spacing(2), |col, entry| {
                col.push(text(format!("{}: {}", entry.name, entry.value)).size(12))
            });
            panel = panel.push(scrollable(rows).height(Length::Fill));
        }

        panel.into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    iced::application("RAW Viewer", RawViewer::update, RawViewer::view)
        .theme(RawViewer::theme)
        .centered()
        .run_with(RawViewer::new)
}
