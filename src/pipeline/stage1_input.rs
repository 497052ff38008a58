use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::io::{dataset, labels, nifti};
use crate::pipeline::Stage;
use crate::volume::{Mask, Series4};

pub struct Stage1Input;

impl Stage1Input {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Input {
    fn name(&self) -> &'static str {
        "stage1_input"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let files = dataset::discover(
            &ctx.input,
            ctx.bold_override.as_deref(),
            ctx.labels_override.as_deref(),
        )?;
        let selected = dataset::select_masks(&files.masks, &ctx.mask_names)?;
        info!(
            bold = %files.bold.display(),
            labels = %files.labels.display(),
            masks = selected.len(),
            "input_files"
        );

        let session = labels::read_session_table(&files.labels)?;
        let image = nifti::read_nifti(&files.bold)?;
        if image.header.dims.len() < 4 {
            bail!(
                "functional series {} is not 4-D",
                files.bold.display()
            );
        }
        let grid = image.header.grid();
        let n_frames = image.header.n_frames();
        if n_frames != session.len() {
            bail!(
                "functional series has {} volumes but labels table has {} rows",
                n_frames,
                session.len()
            );
        }
        ctx.spatial = image.header.spatial.clone();
        ctx.header_tr = image.header.tr_seconds();
        let series = Series4::new(grid, n_frames, image.data)?;

        let mut masks = Vec::with_capacity(selected.len());
        for file in &selected {
            let mask_image = nifti::read_nifti(&file.path)?;
            if mask_image.header.n_frames() != 1 {
                bail!("mask {} must be 3-D", file.path.display());
            }
            let mask_grid = mask_image.header.grid();
            if mask_grid != grid {
                bail!(
                    "mask '{}' grid {} does not match functional grid {}",
                    file.name,
                    mask_grid,
                    grid
                );
            }
            let mask = Mask::from_values(&file.name, mask_grid, &mask_image.data)?;
            info!(mask = %mask.name, voxels = mask.len(), "mask_loaded");
            masks.push(mask);
        }

        for (run, count) in session.run_counts() {
            if count < 2 {
                warn!(run, volumes = count, "run has fewer than 2 volumes");
            }
        }

        info!(
            grid = %grid,
            timepoints = n_frames,
            runs = session.run_counts().len(),
            "session_loaded"
        );

        ctx.report.input_meta.grid = Some([grid.nx, grid.ny, grid.nz]);
        ctx.report.input_meta.timepoints = Some(n_frames as u64);

        ctx.files = Some(files);
        ctx.session = Some(session);
        ctx.series = Some(series);
        ctx.masks = masks;
        Ok(())
    }
}
